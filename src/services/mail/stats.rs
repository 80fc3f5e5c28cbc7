//! Subscriber dashboard snapshot attached to admin alerts.

use chrono::{DateTime, Utc};

use crate::repos::{
    error::RepoError,
    subscriber_repo::{SubscriberCounts, SubscriberRepo, SubscriberRow, TopicCount},
};

pub const TOP_TOPICS_LIMIT: i64 = 10;
pub const RECENT_SUBSCRIBERS_LIMIT: i64 = 5;

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub counts: SubscriberCounts,
    pub top_topics: Vec<TopicCount>,
    pub recent: Vec<SubscriberRow>,
    pub growth_rate: f64,
}

impl DashboardSnapshot {
    /// Growth rate rounded to one decimal, e.g. `+50.0%`.
    pub fn growth_display(&self) -> String {
        format!("{:+.1}%", self.growth_rate)
    }
}

/// Week-over-week growth in percent.
///
/// Returns 0 when both weeks are empty and 100 when only last week is empty.
pub fn growth_rate(this_week: i64, last_week: i64) -> f64 {
    match (this_week, last_week) {
        (0, 0) => 0.0,
        (_, 0) => 100.0,
        (tw, lw) => (tw - lw) as f64 / lw as f64 * 100.0,
    }
}

pub async fn collect(
    repo: &dyn SubscriberRepo,
    now: DateTime<Utc>,
) -> Result<DashboardSnapshot, RepoError> {
    let (counts, top_topics, recent) = tokio::try_join!(
        repo.counts(now),
        repo.top_topics(TOP_TOPICS_LIMIT),
        repo.recent(RECENT_SUBSCRIBERS_LIMIT),
    )?;

    let growth_rate = growth_rate(counts.this_week, counts.last_week);

    Ok(DashboardSnapshot {
        counts,
        top_topics,
        recent,
        growth_rate,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::repos::memory::MemorySubscriberRepo;

    #[test]
    fn growth_rate_edges() {
        assert_eq!(growth_rate(0, 0), 0.0);
        assert_eq!(growth_rate(5, 0), 100.0);
        assert_eq!(growth_rate(15, 10), 50.0);
        assert_eq!(growth_rate(5, 10), -50.0);
    }

    #[tokio::test]
    async fn collect_buckets_by_period() {
        let repo = MemorySubscriberRepo::default();
        let now = Utc::now();
        repo.insert_at("a@x.io", "A", &["rust", "ai"], true, now);
        repo.insert_at("b@x.io", "B", &["rust"], true, now - Duration::days(3));
        repo.insert_at("c@x.io", "C", &["go"], false, now - Duration::days(10));
        repo.insert_at("d@x.io", "D", &[], true, now - Duration::days(20));

        let snapshot = collect(&repo, now).await.unwrap();

        assert_eq!(snapshot.counts.total, 4);
        assert_eq!(snapshot.counts.active, 3);
        assert_eq!(snapshot.counts.this_week, 2);
        assert_eq!(snapshot.counts.last_week, 1);
        assert_eq!(snapshot.counts.this_month, 4);
        assert_eq!(snapshot.growth_rate, 100.0);
        assert_eq!(snapshot.growth_display(), "+100.0%");
        assert_eq!(snapshot.top_topics[0].topic, "rust");
        assert_eq!(snapshot.top_topics[0].count, 2);
        assert_eq!(snapshot.recent[0].email, "a@x.io");
    }
}
