/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - 各 repo (Pg 実装は同じ Database ハンドルを共有) / 認証ゲート / id_codec / キャッシュ / outbox / 外部クライアント
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::{
    blog_repo::BlogRepo, recommendation_repo::RecommendationRepo,
    subscriber_repo::SubscriberRepo,
};
use crate::services::{
    auth::AuthGate, cache::ListingCache, drive::PdfSource, id_codec::IdCodec, mail::Notifier,
    tasks::TaskRunner,
};

#[derive(Clone)]
pub struct AppState {
    pub blogs: Arc<dyn BlogRepo>,
    pub subscribers: Arc<dyn SubscriberRepo>,
    pub recommendations: Arc<dyn RecommendationRepo>,
    pub auth: AuthGate,
    pub id_codec: IdCodec,
    pub listing_cache: ListingCache,
    pub tasks: TaskRunner,
    pub notifier: Notifier,
    pub pdf: Arc<dyn PdfSource>,
}

#[cfg(test)]
pub mod testing {
    //! Fully in-memory state for router tests.

    use std::sync::Arc;

    use secrecy::SecretString;

    use super::AppState;
    use crate::repos::memory::{MemoryBlogRepo, MemoryRecommendationRepo, MemorySubscriberRepo};
    use crate::services::{
        auth::AuthGate,
        cache::ListingCache,
        drive::testing::StaticPdf,
        id_codec::IdCodec,
        mail::{Notifier, mailer::testing::RecordingMailer},
        tasks::{self, TaskQueue},
    };

    pub const ADMIN_SECRET: &str = "s3cret";
    const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    pub struct TestApp {
        pub state: AppState,
        pub blogs: Arc<MemoryBlogRepo>,
        pub subscribers: Arc<MemorySubscriberRepo>,
        pub recommendations: Arc<MemoryRecommendationRepo>,
        pub mailer: Arc<RecordingMailer>,
        pub queue: TaskQueue,
    }

    impl TestApp {
        pub fn new() -> Self {
            let blogs = Arc::new(MemoryBlogRepo::default());
            let subscribers = Arc::new(MemorySubscriberRepo::default());
            let recommendations = Arc::new(MemoryRecommendationRepo::default());
            let mailer = Arc::new(RecordingMailer::default());
            let (runner, queue) = tasks::outbox();

            let state = AppState {
                blogs: blogs.clone(),
                subscribers: subscribers.clone(),
                recommendations: recommendations.clone(),
                auth: AuthGate::new(Some(SecretString::from(ADMIN_SECRET.to_string()))),
                id_codec: IdCodec::new(8, ALPHABET).unwrap(),
                listing_cache: ListingCache::disabled(),
                tasks: runner,
                notifier: Notifier::new(
                    mailer.clone(),
                    "admin@example.com",
                    "Omkar",
                    "https://example.com",
                ),
                pdf: Arc::new(StaticPdf(Ok(b"%PDF-1.4 test"))),
            };

            Self {
                state,
                blogs,
                subscribers,
                recommendations,
                mailer,
                queue,
            }
        }
    }
}
