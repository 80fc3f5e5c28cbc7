/*
 * Responsibility
 * - DB 接続ハンドル (Database) を起動時に生成し AppState 経由で注入する
 * - ensure_connected() は初回だけ pool を作り migration を流す (冪等)
 * - 並行に呼ばれても接続処理は 1 回だけ
 */
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::sync::OnceCell;

use crate::repos::error::RepoError;

#[derive(Clone, Debug)]
pub struct Database {
    // Debug prints [REDACTED]; the URL carries the password
    url: Arc<SecretString>,
    pool: Arc<OnceCell<PgPool>>,
}

impl Database {
    pub fn new(url: SecretString) -> Self {
        Self {
            url: Arc::new(url),
            pool: Arc::new(OnceCell::new()),
        }
    }

    pub async fn ensure_connected(&self) -> Result<&PgPool, RepoError> {
        self.pool
            .get_or_try_init(|| async {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .acquire_timeout(Duration::from_secs(10))
                    .connect(self.url.expose_secret())
                    .await?;

                sqlx::migrate!().run(&pool).await?;
                tracing::info!("database connected and migrated");

                Ok::<_, RepoError>(pool)
            })
            .await
    }
}
