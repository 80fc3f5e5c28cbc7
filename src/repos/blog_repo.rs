/*
 * Responsibility
 * - blogs テーブル向け SQLx 操作 (一覧 / 検索 / curated / 作成 / フラグ更新)
 * - 削除は公開しない
 * - slug の unique 違反は RepoError::Conflict
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::repos::{db::Database, error::RepoError};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BlogRow {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub tags: Vec<String>,
    pub external: Option<String>,
    pub is_starred: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub tags: Vec<String>,
    pub external: Option<String>,
    pub is_starred: bool,
}

/// Filter applied on top of `published = true`.
#[derive(Debug, Clone, Default)]
pub struct BlogFilter {
    pub search: Option<String>,
    pub starred_only: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagsUpdate {
    pub is_starred: Option<bool>,
    pub published: Option<bool>,
}

impl FlagsUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_starred.is_none() && self.published.is_none()
    }
}

#[async_trait]
pub trait BlogRepo: Send + Sync {
    async fn list_published(
        &self,
        filter: &BlogFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogRow>, RepoError>;

    async fn count_published(&self, filter: &BlogFilter) -> Result<i64, RepoError>;

    /// Newest published + starred posts.
    async fn list_curated(&self, limit: i64) -> Result<Vec<BlogRow>, RepoError>;

    async fn find_by_slug(
        &self,
        slug: &str,
        include_unpublished: bool,
    ) -> Result<Option<BlogRow>, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;

    /// Always stores the post as published.
    async fn create(&self, blog: NewBlog) -> Result<BlogRow, RepoError>;

    /// Applies the present flags and stamps `updated_at = now` even if nothing changed.
    async fn update_flags(
        &self,
        slug: &str,
        update: FlagsUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<BlogRow>, RepoError>;
}

#[derive(Clone, Debug)]
pub struct PgBlogRepo {
    db: Database,
}

impl PgBlogRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// `%needle%` with LIKE metacharacters escaped so the search is a literal substring.
pub fn like_pattern(search: &str) -> String {
    let mut out = String::with_capacity(search.len() + 2);
    out.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

const LIST_COLUMNS: &str = r#"
    id, slug, title, description, '' AS content, tags, external,
    is_starred, published, created_at, updated_at
"#;

const FULL_COLUMNS: &str = r#"
    id, slug, title, description, content, tags, external,
    is_starred, published, created_at, updated_at
"#;

const FILTER_CLAUSE: &str = r#"
    published = TRUE
    AND (
        $1::text IS NULL
        OR title ILIKE $1 ESCAPE '\'
        OR description ILIKE $1 ESCAPE '\'
        OR EXISTS (SELECT 1 FROM unnest(tags) AS t(tag) WHERE t.tag ILIKE $1 ESCAPE '\')
    )
    AND (NOT $2 OR is_starred = TRUE)
"#;

#[async_trait]
impl BlogRepo for PgBlogRepo {
    async fn list_published(
        &self,
        filter: &BlogFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;
        let pattern = filter.search.as_deref().map(like_pattern);

        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM blogs WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(pattern)
            .bind(filter.starred_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(rows)
    }

    async fn count_published(&self, filter: &BlogFilter) -> Result<i64, RepoError> {
        let pool = self.db.ensure_connected().await?;
        let pattern = filter.search.as_deref().map(like_pattern);

        let sql = format!("SELECT COUNT(*) FROM blogs WHERE {FILTER_CLAUSE}");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(pattern)
            .bind(filter.starred_only)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    async fn list_curated(&self, limit: i64) -> Result<Vec<BlogRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM blogs \
             WHERE published = TRUE AND is_starred = TRUE \
             ORDER BY created_at DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(rows)
    }

    async fn find_by_slug(
        &self,
        slug: &str,
        include_unpublished: bool,
    ) -> Result<Option<BlogRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let sql = format!(
            "SELECT {FULL_COLUMNS} FROM blogs WHERE slug = $1 AND ($2 OR published = TRUE)"
        );
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(slug)
            .bind(include_unpublished)
            .fetch_optional(pool)
            .await?;

        Ok(row)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM blogs WHERE slug = $1)")
            .bind(slug)
            .fetch_one(pool)
            .await?;

        Ok(exists)
    }

    async fn create(&self, blog: NewBlog) -> Result<BlogRow, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let sql = format!(
            "INSERT INTO blogs (slug, title, description, content, tags, external, is_starred, published) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE) \
             RETURNING {FULL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(&blog.slug)
            .bind(&blog.title)
            .bind(&blog.description)
            .bind(&blog.content)
            .bind(&blog.tags)
            .bind(&blog.external)
            .bind(blog.is_starred)
            .fetch_one(pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn update_flags(
        &self,
        slug: &str,
        update: FlagsUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<BlogRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let sql = format!(
            "UPDATE blogs \
             SET is_starred = COALESCE($2, is_starred), \
                 published = COALESCE($3, published), \
                 updated_at = $4 \
             WHERE slug = $1 \
             RETURNING {FULL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BlogRow>(&sql)
            .bind(slug)
            .bind(update.is_starred)
            .bind(update.published)
            .bind(now)
            .fetch_optional(pool)
            .await?;

        Ok(row)
    }
}
