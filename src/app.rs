/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config → 依存生成 (DB ハンドル / repo / mail / ML / cache / outbox worker) → AppState
 * - Router 組み立て + middleware 適用 → axum::serve()
 * - seed-recommendations サブコマンドの実処理
 */
use std::{panic, path::Path, process, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::{
        blog_repo::PgBlogRepo,
        db::Database,
        recommendation_repo::{PgRecommendationRepo, RecommendationItem, RecommendationRepo},
        subscriber_repo::{PgSubscriberRepo, SubscriberRepo},
    },
    services::{
        auth::AuthGate,
        cache::{CacheClient, ListingCache, ValkeyClient},
        drive::DriveClient,
        embedding::{Embedder, MlClient},
        id_codec::IdCodec,
        mail::{Notifier, SmtpMailer},
        tasks::{self, TaskContext},
    },
    state::AppState,
};

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

pub fn init_tracing() {
    // Ex: RUST_LOG=info,portfolio_blog=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development fails fast; production keeps serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn serve(config: Config) -> Result<()> {
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = Database::new(config.database_url.clone());
    // Warm up the pool; a failure here is retried lazily on the first query.
    if let Err(err) = db.ensure_connected().await {
        tracing::warn!(error = %err, "database not reachable at startup; will retry on demand");
    }

    let subscribers: Arc<dyn SubscriberRepo> = Arc::new(PgSubscriberRepo::new(db.clone()));

    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let notifier = match &config.mail {
        Some(mail) => {
            let mailer = SmtpMailer::new(mail).context("invalid SMTP configuration")?;
            Notifier::new(
                Arc::new(mailer),
                mail.admin_email.clone(),
                mail.from_name.clone(),
                config.site_url.clone(),
            )
        }
        None => {
            tracing::warn!("GMAIL_USER/GMAIL_APP_PASSWORD not set; emails are disabled");
            Notifier::disabled(config.site_url.clone())
        }
    };

    let embedder: Option<Arc<dyn Embedder>> = match &config.ml {
        Some(ml) => Some(Arc::new(
            MlClient::new(http.clone(), ml).context("invalid ML_API_URL")?,
        )),
        None => {
            tracing::warn!("ML_API_URL not set; new posts will not be embedded");
            None
        }
    };

    let listing_cache = match &config.redis_url {
        Some(url) => match ValkeyClient::connect(url).await {
            Ok(client) => {
                tracing::info!(backend = client.backend_name(), "listing cache enabled");
                ListingCache::new(Arc::new(client))
            }
            Err(err) => {
                tracing::warn!(error = %err, "listing cache unavailable; serving from database only");
                ListingCache::disabled()
            }
        },
        None => ListingCache::disabled(),
    };

    let (runner, queue) = tasks::outbox();
    queue.spawn_worker(TaskContext {
        subscribers: subscribers.clone(),
        notifier: notifier.clone(),
        embedder,
    });

    if config.blog_password.is_none() {
        tracing::warn!("BLOG_PASSWORD not set; all admin operations will be rejected");
    }

    Ok(AppState {
        blogs: Arc::new(PgBlogRepo::new(db.clone())),
        subscribers,
        recommendations: Arc::new(PgRecommendationRepo::new(db)),
        auth: AuthGate::new(config.blog_password.clone()),
        id_codec: IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)?,
        listing_cache,
        tasks: runner,
        notifier,
        pdf: Arc::new(DriveClient::new(http)),
    })
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// Replaces the whole recommendations table with the contents of a JSON file
/// shaped as `{ "<blog slug>": [ {slug, title, description, score}, ... ] }`.
pub async fn seed_recommendations(config: Config, file: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let entries = parse_seed_file(&raw)?;

    let db = Database::new(config.database_url.clone());
    let repo = PgRecommendationRepo::new(db);
    let written = repo.replace_all(entries).await?;

    tracing::info!(blogs = written, file = %file.display(), "recommendations seeded");
    Ok(())
}

fn parse_seed_file(raw: &str) -> Result<Vec<(String, Vec<RecommendationItem>)>> {
    let parsed: std::collections::BTreeMap<String, Vec<RecommendationItem>> =
        serde_json::from_str(raw).context("seed file must map blog slugs to recommendation lists")?;

    Ok(parsed
        .into_iter()
        .map(|(slug, items)| (slug.trim().to_lowercase(), items))
        .collect())
}
