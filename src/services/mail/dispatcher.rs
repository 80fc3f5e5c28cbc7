//! Composes transactional emails and fans curated announcements out to the
//! active subscriber list in rate-limited batches.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rand::seq::IndexedRandom;
use serde::Serialize;

use crate::repos::{blog_repo::BlogRow, subscriber_repo::SubscriberRow};

use super::{
    mailer::{MailError, Mailer, OutgoingEmail},
    stats::DashboardSnapshot,
    templates::{self, PostSummary, Rendered},
};

pub const FANOUT_BATCH_SIZE: usize = 10;
pub const FANOUT_BATCH_DELAY: Duration = Duration::from_secs(1);

const CURATED_SUBJECTS: [&str; 5] = [
    "New curated read: {title}",
    "Worth your time: {title}",
    "Fresh from the blog: {title}",
    "I think you'll like this: {title}",
    "Just published: {title}",
];

/// Outcome of a curated-post fan-out. `sent + failed` always equals the
/// number of recipients.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FanOutReport {
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Arc<dyn Mailer>>,
    admin_email: Option<String>,
    sender_name: String,
    site_url: String,
    batch_size: usize,
    batch_delay: Duration,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        admin_email: impl Into<String>,
        sender_name: impl Into<String>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            mailer: Some(mailer),
            admin_email: Some(admin_email.into()),
            sender_name: sender_name.into(),
            site_url: site_url.into(),
            batch_size: FANOUT_BATCH_SIZE,
            batch_delay: FANOUT_BATCH_DELAY,
        }
    }

    /// Notifier that refuses every send; used when SMTP credentials are absent.
    pub fn disabled(site_url: impl Into<String>) -> Self {
        Self {
            mailer: None,
            admin_email: None,
            sender_name: String::new(),
            site_url: site_url.into(),
            batch_size: FANOUT_BATCH_SIZE,
            batch_delay: FANOUT_BATCH_DELAY,
        }
    }

    pub fn with_batching(mut self, size: usize, delay: Duration) -> Self {
        self.batch_size = size.max(1);
        self.batch_delay = delay;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    fn mailer(&self) -> Result<&Arc<dyn Mailer>, MailError> {
        self.mailer.as_ref().ok_or(MailError::Disabled)
    }

    fn admin_email(&self) -> Result<&str, MailError> {
        self.admin_email.as_deref().ok_or(MailError::Disabled)
    }

    async fn deliver(
        &self,
        to: &str,
        reply_to: Option<&str>,
        subject: String,
        rendered: Rendered,
    ) -> Result<(), MailError> {
        self.mailer()?
            .send(OutgoingEmail {
                to: to.to_string(),
                reply_to: reply_to.map(str::to_string),
                subject,
                text: rendered.text,
                html: rendered.html,
            })
            .await
    }

    pub async fn send_welcome(&self, subscriber: &SubscriberRow) -> Result<(), MailError> {
        let rendered = templates::welcome(subscriber, &self.sender_name, &self.site_url)?;
        self.deliver(&subscriber.email, None, "You're in! 🎉".into(), rendered)
            .await
    }

    pub async fn send_welcome_back(&self, subscriber: &SubscriberRow) -> Result<(), MailError> {
        let rendered = templates::welcome_back(subscriber, &self.sender_name)?;
        self.deliver(&subscriber.email, None, "Welcome back! 👋".into(), rendered)
            .await
    }

    pub async fn send_admin_alert(
        &self,
        subscriber: &SubscriberRow,
        snapshot: &DashboardSnapshot,
    ) -> Result<(), MailError> {
        let admin = self.admin_email()?;
        let rendered = templates::admin_alert(subscriber, snapshot)?;
        let subject = format!("New subscriber: {}", subscriber.email);
        self.deliver(admin, None, subject, rendered).await
    }

    /// Relays a contact-form message to the operator inbox with the visitor as reply-to.
    pub async fn send_contact_message(
        &self,
        from_email: &str,
        subject: &str,
        message: &str,
    ) -> Result<(), MailError> {
        let admin = self.admin_email()?;
        let rendered = templates::contact(from_email, message)?;
        self.deliver(
            admin,
            Some(from_email),
            format!("New Message: {subject}"),
            rendered,
        )
        .await
    }

    /// Sends the curated announcement to every recipient. Never fails as a whole;
    /// per-recipient errors are collected into the report.
    pub async fn announce_curated_post(
        &self,
        post: &BlogRow,
        recipients: &[SubscriberRow],
    ) -> FanOutReport {
        let mut report = FanOutReport::default();
        if recipients.is_empty() {
            return report;
        }

        let url = self.post_url(post);
        let summary = PostSummary {
            title: &post.title,
            description: &post.description,
            tags: &post.tags,
            url: &url,
        };

        for (index, batch) in recipients.chunks(self.batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }

            let results = join_all(batch.iter().map(|recipient| async move {
                let rendered = templates::curated_post(&recipient.name, summary, &self.sender_name)?;
                self.deliver(&recipient.email, None, pick_subject(&post.title), rendered)
                    .await
            }))
            .await;

            for (recipient, result) in batch.iter().zip(results) {
                match result {
                    Ok(()) => report.sent += 1,
                    Err(err) => {
                        report.failed += 1;
                        report.errors.push(format!("{}: {err}", recipient.email));
                    }
                }
            }
        }

        tracing::info!(
            slug = %post.slug,
            sent = report.sent,
            failed = report.failed,
            "curated post fan-out finished"
        );
        report
    }

    fn post_url(&self, post: &BlogRow) -> String {
        match post.external.as_deref() {
            Some(external) => external.to_string(),
            None => format!("{}/blog/{}", self.site_url.trim_end_matches('/'), post.slug),
        }
    }
}

fn pick_subject(title: &str) -> String {
    let template = CURATED_SUBJECTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(CURATED_SUBJECTS[0]);
    template.replace("{title}", title)
}
