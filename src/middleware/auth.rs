use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::ProfileRepository,
};

/// Claims read from the identity provider's token.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

/// The signed-in caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Validate an identity token and pull the caller out of it.
pub fn decode_identity(token: &str, secret: &str) -> AppResult<AuthUser> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected identity token");
        AppError::NotAuthenticated
    })?;

    if decoded.claims.sub.trim().is_empty() {
        return Err(AppError::NotAuthenticated);
    }

    Ok(AuthUser {
        user_id: decoded.claims.sub,
        email: decoded.claims.email.filter(|e| !e.is_empty()),
    })
}

/// Admin surface gate: the caller's profile must carry the admin flag.
pub async fn ensure_admin(state: &AppState, user: &AuthUser) -> AppResult<()> {
    let profile = state.store.get_profile(&user.user_id).await?;
    match profile {
        Some(profile) if profile.is_admin => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::NotAuthenticated)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::NotAuthenticated)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AppError::NotAuthenticated)?;

        decode_identity(token, &state.jwt_secret)
    }
}
