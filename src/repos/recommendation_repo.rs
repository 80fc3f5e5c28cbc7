/*
 * Responsibility
 * - recommendations テーブル (blog_slug → 関連記事リスト) の読み取り
 * - seed 用の全件入れ替え (HTTP からは書き込まない)
 * - blogs.slug との整合性はチェックしない
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::repos::{db::Database, error::RepoError};

pub const MAX_RECOMMENDATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecommendationRow {
    pub recommendations: Json<Vec<RecommendationItem>>,
    pub updated_at: DateTime<Utc>,
}

/// Checks the list bound and score range before anything is written.
pub fn validate_items(blog_slug: &str, items: &[RecommendationItem]) -> Result<(), RepoError> {
    if items.len() > MAX_RECOMMENDATIONS {
        return Err(RepoError::Invalid(format!(
            "{blog_slug}: at most {MAX_RECOMMENDATIONS} recommendations allowed, got {}",
            items.len()
        )));
    }
    if let Some(bad) = items
        .iter()
        .find(|i| !(0.0..=1.0).contains(&i.score) || i.slug.trim().is_empty())
    {
        return Err(RepoError::Invalid(format!(
            "{blog_slug}: invalid recommendation `{}` (score {})",
            bad.slug, bad.score
        )));
    }
    Ok(())
}

#[async_trait]
pub trait RecommendationRepo: Send + Sync {
    async fn find(&self, blog_slug: &str) -> Result<Option<RecommendationRow>, RepoError>;

    /// Clears the table and inserts every entry in one transaction. Returns rows written.
    async fn replace_all(
        &self,
        entries: Vec<(String, Vec<RecommendationItem>)>,
    ) -> Result<u64, RepoError>;
}

#[derive(Clone, Debug)]
pub struct PgRecommendationRepo {
    db: Database,
}

impl PgRecommendationRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecommendationRepo for PgRecommendationRepo {
    async fn find(&self, blog_slug: &str) -> Result<Option<RecommendationRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let row = sqlx::query_as::<_, RecommendationRow>(
            r#"
            SELECT recommendations, updated_at
            FROM recommendations
            WHERE blog_slug = $1
            "#,
        )
        .bind(blog_slug.to_lowercase())
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn replace_all(
        &self,
        entries: Vec<(String, Vec<RecommendationItem>)>,
    ) -> Result<u64, RepoError> {
        for (slug, items) in &entries {
            validate_items(slug, items)?;
        }

        let pool = self.db.ensure_connected().await?;
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM recommendations")
            .execute(&mut *tx)
            .await?;

        let mut written = 0;
        for (slug, items) in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO recommendations (blog_slug, recommendations)
                VALUES ($1, $2)
                "#,
            )
            .bind(slug.trim().to_lowercase())
            .bind(Json(items))
            .execute(&mut *tx)
            .await
            .map_err(RepoError::from_sqlx)?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }
}
