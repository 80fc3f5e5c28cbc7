/*
 * Responsibility
 * - 管理用シークレットの取り出し: query `password` → header `password` の順 (body からは読まない)
 * - AdminSecret: 取り出すだけ (公開 GET で非公開記事を見せるかの判定用)
 * - RequireAdmin: AuthGate で照合し、失敗なら 401 (対象レコードの参照より先に評価される)
 */
use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, state::AppState};

pub const SECRET_PARAM: &str = "password";

/// The caller-supplied secret, if any. Never rejects.
#[derive(Clone)]
pub struct AdminSecret(pub Option<String>);

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AdminSecret")
            .field(&self.0.as_ref().map(|_| "***"))
            .finish()
    }
}

fn from_query(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == SECRET_PARAM)
        .map(|(_, value)| value.into_owned())
}

fn from_header(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(SECRET_PARAM)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl FromRequestParts<AppState> for AdminSecret {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(from_query(parts).or_else(|| from_header(parts))))
    }
}

/// Marker proving the request carried the correct admin secret.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AdminSecret(secret) = AdminSecret::from_request_parts(parts, state)
            .await
            .unwrap_or(AdminSecret(None));
        state.auth.verify(secret.as_deref())?;
        Ok(Self)
    }
}
