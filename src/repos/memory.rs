//! In-memory repositories used by unit and router tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::repos::{
    blog_repo::{BlogFilter, BlogRepo, BlogRow, FlagsUpdate, NewBlog},
    error::RepoError,
    recommendation_repo::{RecommendationItem, RecommendationRepo, RecommendationRow, validate_items},
    subscriber_repo::{
        NewSubscriber, SubscriberCounts, SubscriberRepo, SubscriberRow, TopicCount, start_of_day,
    },
};

fn matches_search(row: &BlogRow, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    row.title.to_lowercase().contains(&needle)
        || row.description.to_lowercase().contains(&needle)
        || row.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

#[derive(Default)]
pub struct MemoryBlogRepo {
    rows: Mutex<Vec<BlogRow>>,
}

impl MemoryBlogRepo {
    pub fn insert_at(&self, blog: NewBlog, created_at: DateTime<Utc>) -> BlogRow {
        let mut rows = self.rows.lock().unwrap();
        let row = BlogRow {
            id: rows.len() as i64 + 1,
            slug: blog.slug,
            title: blog.title,
            description: blog.description,
            content: blog.content,
            tags: blog.tags,
            external: blog.external,
            is_starred: blog.is_starred,
            published: true,
            created_at,
            updated_at: created_at,
        };
        rows.push(row.clone());
        row
    }

    pub fn set_published(&self, slug: &str, published: bool) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.slug == slug) {
            row.published = published;
        }
    }

    pub fn get(&self, slug: &str) -> Option<BlogRow> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.slug == slug)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn filtered(&self, filter: &BlogFilter) -> Vec<BlogRow> {
        let mut rows: Vec<BlogRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.published)
            .filter(|r| !filter.starred_only || r.is_starred)
            .filter(|r| filter.search.as_deref().is_none_or(|s| matches_search(r, s)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

#[async_trait]
impl BlogRepo for MemoryBlogRepo {
    async fn list_published(
        &self,
        filter: &BlogFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogRow>, RepoError> {
        Ok(self
            .filtered(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_published(&self, filter: &BlogFilter) -> Result<i64, RepoError> {
        Ok(self.filtered(filter).len() as i64)
    }

    async fn list_curated(&self, limit: i64) -> Result<Vec<BlogRow>, RepoError> {
        let filter = BlogFilter {
            search: None,
            starred_only: true,
        };
        Ok(self
            .filtered(&filter)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn find_by_slug(
        &self,
        slug: &str,
        include_unpublished: bool,
    ) -> Result<Option<BlogRow>, RepoError> {
        Ok(self
            .get(slug)
            .filter(|r| include_unpublished || r.published))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        Ok(self.get(slug).is_some())
    }

    async fn create(&self, blog: NewBlog) -> Result<BlogRow, RepoError> {
        if self.get(&blog.slug).is_some() {
            return Err(RepoError::Conflict);
        }
        Ok(self.insert_at(blog, Utc::now()))
    }

    async fn update_flags(
        &self,
        slug: &str,
        update: FlagsUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<BlogRow>, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| r.slug == slug) else {
            return Ok(None);
        };
        if let Some(v) = update.is_starred {
            row.is_starred = v;
        }
        if let Some(v) = update.published {
            row.published = v;
        }
        row.updated_at = now;
        Ok(Some(row.clone()))
    }
}

/// Every call fails, for exercising error paths.
pub struct FailingBlogRepo;

fn unavailable() -> RepoError {
    RepoError::Db(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl BlogRepo for FailingBlogRepo {
    async fn list_published(&self, _: &BlogFilter, _: i64, _: i64) -> Result<Vec<BlogRow>, RepoError> {
        Err(unavailable())
    }

    async fn count_published(&self, _: &BlogFilter) -> Result<i64, RepoError> {
        Err(unavailable())
    }

    async fn list_curated(&self, _: i64) -> Result<Vec<BlogRow>, RepoError> {
        Err(unavailable())
    }

    async fn find_by_slug(&self, _: &str, _: bool) -> Result<Option<BlogRow>, RepoError> {
        Err(unavailable())
    }

    async fn slug_exists(&self, _: &str) -> Result<bool, RepoError> {
        Err(unavailable())
    }

    async fn create(&self, _: NewBlog) -> Result<BlogRow, RepoError> {
        Err(unavailable())
    }

    async fn update_flags(
        &self,
        _: &str,
        _: FlagsUpdate,
        _: DateTime<Utc>,
    ) -> Result<Option<BlogRow>, RepoError> {
        Err(unavailable())
    }
}

#[derive(Default)]
pub struct MemorySubscriberRepo {
    rows: Mutex<Vec<SubscriberRow>>,
}

impl MemorySubscriberRepo {
    pub fn insert_at(
        &self,
        email: &str,
        name: &str,
        topics: &[&str],
        is_active: bool,
        subscribed_at: DateTime<Utc>,
    ) {
        self.rows.lock().unwrap().push(SubscriberRow {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            is_active,
            subscribed_at,
        });
    }

    pub fn get(&self, email: &str) -> Option<SubscriberRow> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.email == email)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriberRepo for MemorySubscriberRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRow>, RepoError> {
        Ok(self.get(email))
    }

    async fn create(&self, subscriber: NewSubscriber) -> Result<SubscriberRow, RepoError> {
        if self.get(&subscriber.email).is_some() {
            return Err(RepoError::Conflict);
        }
        let row = SubscriberRow {
            id: Uuid::new_v4(),
            email: subscriber.email,
            name: subscriber.name,
            topics: subscriber.topics,
            is_active: true,
            subscribed_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn reactivate(
        &self,
        email: &str,
        name: Option<&str>,
        topics: Option<&[String]>,
    ) -> Result<Option<SubscriberRow>, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| r.email == email) else {
            return Ok(None);
        };
        row.is_active = true;
        if let Some(name) = name {
            row.name = name.to_string();
        }
        if let Some(topics) = topics {
            row.topics = topics.to_vec();
        }
        Ok(Some(row.clone()))
    }

    async fn count_active(&self) -> Result<i64, RepoError> {
        Ok(self.rows.lock().unwrap().iter().filter(|r| r.is_active).count() as i64)
    }

    async fn list_active(&self) -> Result<Vec<SubscriberRow>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }

    async fn counts(&self, now: DateTime<Utc>) -> Result<SubscriberCounts, RepoError> {
        let rows = self.rows.lock().unwrap();
        let since = |t: DateTime<Utc>| rows.iter().filter(|r| r.subscribed_at >= t).count() as i64;
        let week_ago = now - Duration::days(7);
        let two_weeks_ago = now - Duration::days(14);

        Ok(SubscriberCounts {
            total: rows.len() as i64,
            active: rows.iter().filter(|r| r.is_active).count() as i64,
            today: since(start_of_day(now)),
            this_week: since(week_ago),
            this_month: since(now - Duration::days(30)),
            last_week: rows
                .iter()
                .filter(|r| r.subscribed_at >= two_weeks_ago && r.subscribed_at < week_ago)
                .count() as i64,
        })
    }

    async fn top_topics(&self, limit: i64) -> Result<Vec<TopicCount>, RepoError> {
        let rows = self.rows.lock().unwrap();
        let mut counts: Vec<TopicCount> = Vec::new();
        for topic in rows.iter().filter(|r| r.is_active).flat_map(|r| &r.topics) {
            match counts.iter_mut().find(|c| &c.topic == topic) {
                Some(c) => c.count += 1,
                None => counts.push(TopicCount {
                    topic: topic.clone(),
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)));
        counts.truncate(limit as usize);
        Ok(counts)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<SubscriberRow>, RepoError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.subscribed_at.cmp(&a.subscribed_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryRecommendationRepo {
    rows: Mutex<HashMap<String, RecommendationRow>>,
}

#[async_trait]
impl RecommendationRepo for MemoryRecommendationRepo {
    async fn find(&self, blog_slug: &str) -> Result<Option<RecommendationRow>, RepoError> {
        let slug = blog_slug.to_lowercase();
        Ok(self.rows.lock().unwrap().get(&slug).cloned())
    }

    async fn replace_all(
        &self,
        entries: Vec<(String, Vec<RecommendationItem>)>,
    ) -> Result<u64, RepoError> {
        for (slug, items) in &entries {
            validate_items(slug, items)?;
        }
        let now = Utc::now();
        let mut rows = self.rows.lock().unwrap();
        rows.clear();
        for (slug, items) in entries {
            rows.insert(
                slug.trim().to_lowercase(),
                RecommendationRow {
                    recommendations: sqlx::types::Json(items),
                    updated_at: now,
                },
            );
        }
        Ok(rows.len() as u64)
    }
}
