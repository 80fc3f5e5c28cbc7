/*
 * Responsibility
 * - subscribers テーブル向け SQLx 操作
 * - email は 1 件 1 レコード (再購読は reactivate で更新)
 * - admin 通知用の集計 (期間別件数 / topic 上位 / 最近の購読者)
 */
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::repos::{db::Database, error::RepoError};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriberRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub topics: Vec<String>,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub email: String,
    pub name: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TopicCount {
    pub topic: String,
    pub count: i64,
}

/// Raw numbers for the admin dashboard snapshot.
#[derive(Debug, Clone, Default)]
pub struct SubscriberCounts {
    pub total: i64,
    pub active: i64,
    pub today: i64,
    pub this_week: i64,
    pub this_month: i64,
    pub last_week: i64,
}

#[async_trait]
pub trait SubscriberRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRow>, RepoError>;

    async fn create(&self, subscriber: NewSubscriber) -> Result<SubscriberRow, RepoError>;

    /// Flips `is_active` back on. `name`/`topics` replace the stored values only when given.
    async fn reactivate(
        &self,
        email: &str,
        name: Option<&str>,
        topics: Option<&[String]>,
    ) -> Result<Option<SubscriberRow>, RepoError>;

    async fn count_active(&self) -> Result<i64, RepoError>;

    async fn list_active(&self) -> Result<Vec<SubscriberRow>, RepoError>;

    async fn counts(&self, now: DateTime<Utc>) -> Result<SubscriberCounts, RepoError>;

    async fn top_topics(&self, limit: i64) -> Result<Vec<TopicCount>, RepoError>;

    async fn recent(&self, limit: i64) -> Result<Vec<SubscriberRow>, RepoError>;
}

#[derive(Clone, Debug)]
pub struct PgSubscriberRepo {
    db: Database,
}

impl PgSubscriberRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Midnight UTC of `now`'s day.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or(now)
}

#[async_trait]
impl SubscriberRepo for PgSubscriberRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, name, topics, is_active, subscribed_at
            FROM subscribers
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn create(&self, subscriber: NewSubscriber) -> Result<SubscriberRow, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            INSERT INTO subscribers (email, name, topics, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, email, name, topics, is_active, subscribed_at
            "#,
        )
        .bind(&subscriber.email)
        .bind(&subscriber.name)
        .bind(&subscriber.topics)
        .fetch_one(pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn reactivate(
        &self,
        email: &str,
        name: Option<&str>,
        topics: Option<&[String]>,
    ) -> Result<Option<SubscriberRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            UPDATE subscribers
            SET
                is_active = TRUE,
                name = COALESCE($2, name),
                topics = COALESCE($3, topics),
                updated_at = now()
            WHERE email = $1
            RETURNING id, email, name, topics, is_active, subscribed_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(topics)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn count_active(&self) -> Result<i64, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscribers WHERE is_active")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    async fn list_active(&self) -> Result<Vec<SubscriberRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let rows = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, name, topics, is_active, subscribed_at
            FROM subscribers
            WHERE is_active
            ORDER BY subscribed_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn counts(&self, now: DateTime<Utc>) -> Result<SubscriberCounts, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let today = start_of_day(now);
        let week_ago = now - Duration::days(7);
        let two_weeks_ago = now - Duration::days(14);
        let month_ago = now - Duration::days(30);

        let (total, active, today, this_week, this_month, last_week): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE is_active),
                COUNT(*) FILTER (WHERE subscribed_at >= $1),
                COUNT(*) FILTER (WHERE subscribed_at >= $2),
                COUNT(*) FILTER (WHERE subscribed_at >= $4),
                COUNT(*) FILTER (WHERE subscribed_at >= $3 AND subscribed_at < $2)
            FROM subscribers
            "#,
        )
        .bind(today)
        .bind(week_ago)
        .bind(two_weeks_ago)
        .bind(month_ago)
        .fetch_one(pool)
        .await?;

        Ok(SubscriberCounts {
            total,
            active,
            today,
            this_week,
            this_month,
            last_week,
        })
    }

    async fn top_topics(&self, limit: i64) -> Result<Vec<TopicCount>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let rows = sqlx::query_as::<_, TopicCount>(
            r#"
            SELECT t.topic AS topic, COUNT(*) AS count
            FROM subscribers, unnest(topics) AS t(topic)
            WHERE is_active
            GROUP BY t.topic
            ORDER BY count DESC, topic ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<SubscriberRow>, RepoError> {
        let pool = self.db.ensure_connected().await?;

        let rows = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, name, topics, is_active, subscribed_at
            FROM subscribers
            ORDER BY subscribed_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
