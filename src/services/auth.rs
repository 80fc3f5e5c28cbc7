/*
 * Responsibility
 * - 管理系操作 (作成 / フラグ更新 / 非公開記事の閲覧) の共有シークレット照合
 * - サーバ側の BLOG_PASSWORD 未設定なら常に拒否 (fail-closed)
 * - 比較は定数時間
 */
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("admin secret not configured on server")]
    NotConfigured,
    #[error("missing admin secret")]
    Missing,
    #[error("invalid admin secret")]
    Invalid,
}

#[derive(Clone, Debug)]
pub struct AuthGate {
    secret: Option<SecretString>,
}

impl AuthGate {
    pub fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    pub fn verify(&self, supplied: Option<&str>) -> Result<(), AuthError> {
        let expected = self.secret.as_ref().ok_or(AuthError::NotConfigured)?;
        let supplied = supplied.ok_or(AuthError::Missing)?;

        let matches: bool = expected
            .expose_secret()
            .as_bytes()
            .ct_eq(supplied.as_bytes())
            .into();

        if matches {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }

    /// For reads where a bad secret simply means "public view".
    pub fn is_admin(&self, supplied: Option<&str>) -> bool {
        supplied.is_some() && self.verify(supplied).is_ok()
    }
}
