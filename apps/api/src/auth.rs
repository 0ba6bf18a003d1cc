//! Bearer-token authentication. Token verification is delegated to the
//! managed auth service; this module only extracts the token and maps the
//! verified user onto a `Tenant`.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// The recruiter account a request acts on behalf of. All data is scoped by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => AppError::Unauthorized,
            AuthError::Unavailable(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Tenant, AuthError>;
}

/// Verifies tokens against the Supabase Auth `/auth/v1/user` endpoint.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: Uuid,
    email: Option<String>,
}

impl SupabaseAuth {
    pub fn new(base_url: String, anon_key: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            base_url,
            anon_key,
        })
    }
}

#[async_trait]
impl TokenVerifier for SupabaseAuth {
    async fn verify(&self, token: &str) -> Result<Tenant, AuthError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AuthError::Unavailable(format!("auth service returned {status}")));
        }
        if !status.is_success() {
            warn!("Token rejected by auth service ({status})");
            return Err(AuthError::InvalidToken);
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(Tenant {
            id: user.id,
            email: user.email,
        })
    }
}

/// Returns the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        Ok(state.auth.verify(token).await?)
    }
}
