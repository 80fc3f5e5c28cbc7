//! In-memory outbox for side effects that must not delay the HTTP response.
//!
//! Handlers `enqueue` tasks on an unbounded channel; a worker spawned at
//! startup runs each task on its own tokio task. Nothing is persisted: tasks
//! still queued or running when the process exits are lost, and failures are
//! logged without retry.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
};

use crate::repos::{
    blog_repo::BlogRow,
    error::RepoError,
    subscriber_repo::{SubscriberRepo, SubscriberRow},
};
use crate::services::{
    embedding::{Embedder, EmbeddingError},
    mail::{MailError, Notifier, stats},
};

#[derive(Debug, Clone)]
pub enum BackgroundTask {
    AnnounceCuratedPost(BlogRow),
    EmbedPost(BlogRow),
    Welcome(SubscriberRow),
    WelcomeBack(SubscriberRow),
    AdminAlert(SubscriberRow),
}

impl BackgroundTask {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AnnounceCuratedPost(_) => "announce_curated_post",
            Self::EmbedPost(_) => "embed_post",
            Self::Welcome(_) => "welcome_email",
            Self::WelcomeBack(_) => "welcome_back_email",
            Self::AdminAlert(_) => "admin_alert",
        }
    }

    fn needs_mail(&self) -> bool {
        !matches!(self, Self::EmbedPost(_))
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Everything a task needs to run.
#[derive(Clone)]
pub struct TaskContext {
    pub subscribers: Arc<dyn SubscriberRepo>,
    pub notifier: Notifier,
    pub embedder: Option<Arc<dyn Embedder>>,
}

impl TaskContext {
    async fn run(&self, task: BackgroundTask) -> Result<(), TaskError> {
        if task.needs_mail() && !self.notifier.is_enabled() {
            tracing::debug!(task = task.kind(), "mail not configured; skipping");
            return Ok(());
        }

        match task {
            BackgroundTask::AnnounceCuratedPost(post) => {
                let recipients = self.subscribers.list_active().await?;
                self.notifier.announce_curated_post(&post, &recipients).await;
            }
            BackgroundTask::EmbedPost(post) => match &self.embedder {
                Some(embedder) => {
                    embedder.embed_post(&post).await?;
                }
                None => tracing::debug!(slug = %post.slug, "ml service not configured; skipping"),
            },
            BackgroundTask::Welcome(subscriber) => self.notifier.send_welcome(&subscriber).await?,
            BackgroundTask::WelcomeBack(subscriber) => {
                self.notifier.send_welcome_back(&subscriber).await?
            }
            BackgroundTask::AdminAlert(subscriber) => {
                let snapshot = stats::collect(self.subscribers.as_ref(), Utc::now()).await?;
                self.notifier.send_admin_alert(&subscriber, &snapshot).await?;
            }
        }
        Ok(())
    }
}

/// Sending half of the outbox, cheap to clone into handlers.
#[derive(Clone)]
pub struct TaskRunner {
    tx: mpsc::UnboundedSender<BackgroundTask>,
}

/// Receiving half; either spawned as the worker or inspected directly in tests.
pub struct TaskQueue {
    rx: mpsc::UnboundedReceiver<BackgroundTask>,
}

pub fn outbox() -> (TaskRunner, TaskQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskRunner { tx }, TaskQueue { rx })
}

impl TaskRunner {
    /// Never blocks. If the worker is gone the task is dropped with a warning.
    pub fn enqueue(&self, task: BackgroundTask) {
        let kind = task.kind();
        if self.tx.send(task).is_err() {
            tracing::warn!(task = kind, "background worker stopped; task dropped");
        }
    }
}

impl TaskQueue {
    /// Runs tasks until every `TaskRunner` is dropped, then waits for the ones in flight.
    pub fn spawn_worker(mut self, ctx: TaskContext) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut running = JoinSet::new();

            while let Some(task) = self.rx.recv().await {
                let ctx = ctx.clone();
                running.spawn(async move {
                    let kind = task.kind();
                    match ctx.run(task).await {
                        Ok(()) => tracing::debug!(task = kind, "background task finished"),
                        Err(err) => tracing::warn!(task = kind, error = %err, "background task failed"),
                    }
                });

                // Reap finished tasks so the set does not grow without bound.
                while running.try_join_next().is_some() {}
            }

            while running.join_next().await.is_some() {}
            tracing::info!("background worker stopped");
        })
    }

    #[cfg(test)]
    pub fn drain(&mut self) -> Vec<BackgroundTask> {
        let mut tasks = Vec::new();
        while let Ok(task) = self.rx.try_recv() {
            tasks.push(task);
        }
        tasks
    }
}
