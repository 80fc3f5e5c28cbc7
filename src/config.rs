/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, BLOG_PASSWORD, Gmail, ML API など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 任意のサブシステム (mail / ml / cache) は未設定なら None
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use secrecy::SecretString;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// SMTP relay credentials (Gmail account + app password by default).
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_name: String,
    /// Receives contact-form messages and new-subscriber alerts.
    pub admin_email: String,
}

/// External embedding/recommendation service.
#[derive(Clone, Debug)]
pub struct MlConfig {
    pub base_url: Url,
    pub secret: SecretString,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: SecretString,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub sqids_min_length: usize,
    pub sqids_alphabet: String,

    // None => all admin writes are rejected (fail closed)
    pub blog_password: Option<SecretString>,
    pub site_url: String,

    pub mail: Option<MailConfig>,
    pub ml: Option<MlConfig>,
    pub redis_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = std::env::var("DATABASE_URL")
            .map(SecretString::from)
            .map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let sqids_min_length = std::env::var("SQIDS_MIN_LENGTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);

        let sqids_alphabet = std::env::var("SQIDS_ALPHABET").unwrap_or_else(|_| {
            "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string()
        });

        let blog_password = non_empty_var("BLOG_PASSWORD").map(SecretString::from);

        let site_url = non_empty_var("SITE_URL")
            .unwrap_or_else(|| "https://omkarchebale.vercel.app".to_string());

        let mail = MailConfig::from_env()?;
        let ml = MlConfig::from_env()?;
        let redis_url = non_empty_var("REDIS_URL");

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            sqids_min_length,
            sqids_alphabet,
            blog_password,
            site_url,
            mail,
            ml,
            redis_url,
        })
    }
}

impl MailConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(username), Some(password)) =
            (non_empty_var("GMAIL_USER"), non_empty_var("GMAIL_APP_PASSWORD"))
        else {
            return Ok(None);
        };

        let smtp_host = non_empty_var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".into());
        let smtp_port = match non_empty_var("SMTP_PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("SMTP_PORT"))?,
            None => 587,
        };
        let from_name = non_empty_var("MAIL_FROM_NAME").unwrap_or_else(|| "Omkar Chebale".into());
        let admin_email = non_empty_var("ADMIN_EMAIL").unwrap_or_else(|| username.clone());

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            username,
            password: SecretString::from(password),
            from_name,
            admin_email,
        }))
    }
}

impl MlConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(raw) = non_empty_var("ML_API_URL") else {
            return Ok(None);
        };
        let base_url = Url::parse(&raw).map_err(|_| ConfigError::Invalid("ML_API_URL"))?;
        let secret = non_empty_var("ML_API_SECRET").ok_or(ConfigError::Missing("ML_API_SECRET"))?;

        Ok(Some(Self {
            base_url,
            secret: SecretString::from(secret),
        }))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
