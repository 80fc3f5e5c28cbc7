/*
 * Responsibility
 * - /blog 系 handler (一覧 / 作成 / 取得 / フラグ更新)
 * - 書き込み系は RequireAdmin を先に評価 (レコードの存在は認証前に漏らさない)
 * - 作成後の副作用 (curated 配信 / ML 連携) は outbox に積むだけで待たない
 */
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    api::v1::{
        dto::blog::{
            BlogDetail, BlogDetailResponse, BlogListItem, BlogListResponse, CreateBlogRequest,
            CreateBlogResponse, FlagsBody, FlagsQuery, FlagsView, ListBlogsParams,
            UpdateFlagsResponse, merge_flags,
        },
        extractors::{AdminSecret, RequireAdmin},
    },
    error::AppError,
    repos::{
        blog_repo::{FlagsUpdate, NewBlog},
        error::RepoError,
    },
    services::{
        blog_query::{self, BlogListQuery, BlogListing, Pagination},
        cache::listing::Lookup,
        slug::slugify,
        tasks::BackgroundTask,
    },
    state::AppState,
};

pub const LISTING_CACHE_CONTROL: &str = "public, s-maxage=60, stale-while-revalidate=30";
const NO_STORE: &str = "no-store";

fn listing_body(listing: BlogListing, state: &AppState) -> Result<String, AppError> {
    let to_items = |rows: Vec<_>| {
        rows.into_iter()
            .map(|row| BlogListItem::from_row(row, &state.id_codec))
            .collect::<Result<Vec<_>, _>>()
    };

    let response = BlogListResponse {
        success: true,
        error: None,
        posts: to_items(listing.posts)?,
        curated_posts: to_items(listing.curated)?,
        pagination: listing.pagination,
    };

    serde_json::to_string(&response).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize blog listing");
        AppError::Internal
    })
}

fn listing_response(cache_control: &'static str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, cache_control),
        ],
        body,
    )
        .into_response()
}

pub async fn list_blogs(
    State(state): State<AppState>,
    params: Result<Query<ListBlogsParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    let query = BlogListQuery::from_params(
        params.page.as_deref(),
        params.search.as_deref(),
        params.starred.as_deref(),
    );
    let cache_control = if query.is_cacheable() {
        LISTING_CACHE_CONTROL
    } else {
        NO_STORE
    };

    let slot = match state.listing_cache.get(&query).await {
        Lookup::Hit(body) => return listing_response(cache_control, body),
        Lookup::Miss(slot) => slot,
    };

    let rendered = match blog_query::list_posts(state.blogs.as_ref(), &query).await {
        Ok(listing) => listing_body(listing, &state),
        Err(e) => Err(AppError::from(e)),
    };

    match rendered {
        Ok(body) => {
            if let Some(slot) = slot {
                state.listing_cache.put(slot, &body).await;
            }
            listing_response(cache_control, body)
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CACHE_CONTROL, NO_STORE)],
            Json(BlogListResponse {
                success: false,
                error: Some("Failed to fetch posts".into()),
                posts: Vec::new(),
                curated_posts: Vec::new(),
                pagination: Pagination::new(query.page, 0),
            }),
        )
            .into_response(),
    }
}

pub async fn create_blog(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    payload: Result<Json<CreateBlogRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateBlogResponse>), AppError> {
    let Json(req) = payload?;
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_BLOG", m))?;

    let title = req.title.unwrap_or_default().trim().to_string();
    let slug = slugify(&title);
    if slug.is_empty() {
        return Err(AppError::bad_request(
            "INVALID_TITLE",
            "Title must contain at least one letter or digit",
        ));
    }

    if state.blogs.slug_exists(&slug).await? {
        return Err(slug_taken());
    }

    let new_blog = NewBlog {
        slug,
        title,
        description: req.description.unwrap_or_default().trim().to_string(),
        content: req.body.unwrap_or_default(),
        tags: req
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        external: req
            .external
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
        is_starred: req.is_starred.unwrap_or(false),
    };

    let row = match state.blogs.create(new_blog).await {
        Ok(row) => row,
        Err(RepoError::Conflict) => return Err(slug_taken()),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(slug = %row.slug, starred = row.is_starred, "blog post created");

    if row.is_starred {
        state
            .tasks
            .enqueue(BackgroundTask::AnnounceCuratedPost(row.clone()));
    }
    state.tasks.enqueue(BackgroundTask::EmbedPost(row.clone()));
    state.listing_cache.invalidate().await;

    Ok((
        StatusCode::CREATED,
        Json(CreateBlogResponse {
            success: true,
            message: "Blog post created successfully",
            id: state.id_codec.encode(row.id)?,
            slug: row.slug,
        }),
    ))
}

fn slug_taken() -> AppError {
    AppError::conflict("SLUG_TAKEN", "A post with this title already exists")
}

/// Public read; a valid admin secret also reveals unpublished posts.
pub async fn get_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AdminSecret(secret): AdminSecret,
) -> Result<Json<BlogDetailResponse>, AppError> {
    let include_unpublished = state.auth.is_admin(secret.as_deref());

    let row = state
        .blogs
        .find_by_slug(&slug, include_unpublished)
        .await?
        .ok_or(AppError::not_found("Blog"))?;

    Ok(Json(BlogDetailResponse {
        success: true,
        blog: BlogDetail::from_row(row, &state.id_codec)?,
    }))
}

pub async fn update_blog(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(slug): Path<String>,
    query: Result<Query<FlagsQuery>, QueryRejection>,
    body: Result<Option<Json<FlagsBody>>, JsonRejection>,
) -> Result<Json<UpdateFlagsResponse>, AppError> {
    let Query(query) = query?;
    let body = body?.map(|Json(b)| b);
    apply_flags(&state, &slug, merge_flags(&query, body.as_ref())).await
}

/// Query-string only variant of the flag update, for links and simple clients.
pub async fn set_blog_flags(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(slug): Path<String>,
    query: Result<Query<FlagsQuery>, QueryRejection>,
) -> Result<Json<UpdateFlagsResponse>, AppError> {
    let Query(query) = query?;
    apply_flags(&state, &slug, merge_flags(&query, None)).await
}

async fn apply_flags(
    state: &AppState,
    slug: &str,
    update: FlagsUpdate,
) -> Result<Json<UpdateFlagsResponse>, AppError> {
    if update.is_empty() {
        return Err(AppError::bad_request(
            "NO_UPDATES",
            "No valid updates provided. Only isStarred and published can be updated.",
        ));
    }

    let row = state
        .blogs
        .update_flags(slug, update, Utc::now())
        .await?
        .ok_or(AppError::not_found("Blog"))?;

    tracing::info!(
        slug = %row.slug,
        starred = row.is_starred,
        published = row.published,
        "blog flags updated"
    );
    state.listing_cache.invalidate().await;

    Ok(Json(UpdateFlagsResponse {
        success: true,
        message: "Blog updated successfully",
        blog: FlagsView {
            slug: row.slug,
            is_starred: row.is_starred,
            published: row.published,
            updated_at: row.updated_at,
        },
    }))
}
