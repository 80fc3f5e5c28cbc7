//! Askama templates for every outgoing email. Each message has an HTML and a
//! plain text variant rendered from the same fields.

use askama::Template;

use crate::repos::subscriber_repo::{SubscriberRow, TopicCount};

use super::mailer::MailError;

/// Both renderings of one message.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub text: String,
    pub html: String,
}

/// First word of the subscriber's name, or a friendly fallback.
pub fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or("there")
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    first_name: &'a str,
    topics: &'a [String],
    sender_name: &'a str,
    site_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    first_name: &'a str,
    topics: &'a [String],
    sender_name: &'a str,
    site_url: &'a str,
}

pub fn welcome(
    subscriber: &SubscriberRow,
    sender_name: &str,
    site_url: &str,
) -> Result<Rendered, MailError> {
    let first_name = first_name(&subscriber.name);
    let topics = subscriber.topics.as_slice();
    Ok(Rendered {
        html: WelcomeHtml {
            first_name,
            topics,
            sender_name,
            site_url,
        }
        .render()?,
        text: WelcomeText {
            first_name,
            topics,
            sender_name,
            site_url,
        }
        .render()?,
    })
}

#[derive(Template)]
#[template(path = "email/welcome_back.html")]
struct WelcomeBackHtml<'a> {
    first_name: &'a str,
    topics: &'a [String],
    sender_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome_back.txt")]
struct WelcomeBackText<'a> {
    first_name: &'a str,
    topics: &'a [String],
    sender_name: &'a str,
}

pub fn welcome_back(subscriber: &SubscriberRow, sender_name: &str) -> Result<Rendered, MailError> {
    let first_name = first_name(&subscriber.name);
    let topics = subscriber.topics.as_slice();
    Ok(Rendered {
        html: WelcomeBackHtml {
            first_name,
            topics,
            sender_name,
        }
        .render()?,
        text: WelcomeBackText {
            first_name,
            topics,
            sender_name,
        }
        .render()?,
    })
}

#[derive(Template)]
#[template(path = "email/admin_alert.html")]
struct AdminAlertHtml<'a> {
    subscriber_email: &'a str,
    subscriber_name: &'a str,
    subscriber_topics: &'a [String],
    total: i64,
    active: i64,
    today: i64,
    this_week: i64,
    this_month: i64,
    growth: &'a str,
    top_topics: &'a [TopicCount],
    recent: &'a [SubscriberRow],
}

#[derive(Template)]
#[template(path = "email/admin_alert.txt")]
struct AdminAlertText<'a> {
    subscriber_email: &'a str,
    subscriber_name: &'a str,
    subscriber_topics: &'a [String],
    total: i64,
    active: i64,
    today: i64,
    this_week: i64,
    this_month: i64,
    growth: &'a str,
    top_topics: &'a [TopicCount],
    recent: &'a [SubscriberRow],
}

pub fn admin_alert(
    subscriber: &SubscriberRow,
    snapshot: &super::stats::DashboardSnapshot,
) -> Result<Rendered, MailError> {
    let growth = snapshot.growth_display();
    let c = &snapshot.counts;

    Ok(Rendered {
        html: AdminAlertHtml {
            subscriber_email: &subscriber.email,
            subscriber_name: &subscriber.name,
            subscriber_topics: &subscriber.topics,
            total: c.total,
            active: c.active,
            today: c.today,
            this_week: c.this_week,
            this_month: c.this_month,
            growth: &growth,
            top_topics: &snapshot.top_topics,
            recent: &snapshot.recent,
        }
        .render()?,
        text: AdminAlertText {
            subscriber_email: &subscriber.email,
            subscriber_name: &subscriber.name,
            subscriber_topics: &subscriber.topics,
            total: c.total,
            active: c.active,
            today: c.today,
            this_week: c.this_week,
            this_month: c.this_month,
            growth: &growth,
            top_topics: &snapshot.top_topics,
            recent: &snapshot.recent,
        }
        .render()?,
    })
}

/// Post fields shown in the curated announcement.
#[derive(Debug, Clone, Copy)]
pub struct PostSummary<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub tags: &'a [String],
    pub url: &'a str,
}

#[derive(Template)]
#[template(path = "email/curated_post.html")]
struct CuratedPostHtml<'a> {
    first_name: &'a str,
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    url: &'a str,
    sender_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/curated_post.txt")]
struct CuratedPostText<'a> {
    first_name: &'a str,
    title: &'a str,
    description: &'a str,
    url: &'a str,
    sender_name: &'a str,
}

pub fn curated_post(
    recipient_name: &str,
    post: PostSummary<'_>,
    sender_name: &str,
) -> Result<Rendered, MailError> {
    let first_name = first_name(recipient_name);
    Ok(Rendered {
        html: CuratedPostHtml {
            first_name,
            title: post.title,
            description: post.description,
            tags: post.tags,
            url: post.url,
            sender_name,
        }
        .render()?,
        text: CuratedPostText {
            first_name,
            title: post.title,
            description: post.description,
            url: post.url,
            sender_name,
        }
        .render()?,
    })
}

#[derive(Template)]
#[template(path = "email/contact.html")]
struct ContactHtml<'a> {
    sender: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactText<'a> {
    sender: &'a str,
    message: &'a str,
}

pub fn contact(sender: &str, message: &str) -> Result<Rendered, MailError> {
    Ok(Rendered {
        html: ContactHtml { sender, message }.render()?,
        text: ContactText { sender, message }.render()?,
    })
}
