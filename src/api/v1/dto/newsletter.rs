/*
 * Responsibility
 * - /newsletter の request/response DTO
 * - email は trim + lowercase、topics は最大 5 件
 */
use serde::{Deserialize, Serialize};

use crate::repos::subscriber_repo::NewSubscriber;

pub const MAX_TOPICS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
}

impl SubscribeRequest {
    /// Normalizes and validates the request into a storable subscriber.
    pub fn validate(self) -> Result<NewSubscriber, &'static str> {
        let email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or("Email is required")?;

        if !is_valid_email(&email) {
            return Err("Please enter a valid email address");
        }

        let topics: Vec<String> = self
            .topics
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.len() > MAX_TOPICS {
            return Err("You can pick at most 5 topics");
        }

        Ok(NewSubscriber {
            email,
            name: self.name.map(|n| n.trim().to_string()).unwrap_or_default(),
            topics,
        })
    }
}

/// Same acceptance as `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.chars().any(|c| c == '@' || c.is_whitespace());
    if !clean(local) || !clean(domain) {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SubscriberCountResponse {
    pub success: bool,
    pub count: i64,
}
