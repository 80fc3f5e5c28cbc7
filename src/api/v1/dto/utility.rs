/*
 * Responsibility
 * - 小物エンドポイント (send-email / getpdf / webview preview) の DTO
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

pub struct ContactMessage {
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(self) -> Result<ContactMessage, &'static str> {
        let required = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (
            required(self.email),
            required(self.subject),
            required(self.message),
        ) {
            (Some(email), Some(subject), Some(message)) => Ok(ContactMessage {
                email: email.trim().to_string(),
                subject,
                message,
            }),
            _ => Err("All fields are required"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct PdfParams {
    pub fileid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub data: Option<String>,
}
