use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use boardkeeper_common::{AppError, Principal};

use crate::jwt::JwtService;

/// Extracts the caller from a `Bearer` token.
///
/// Any state that can hand out a [`JwtService`] via `FromRef` can use this
/// extractor; a missing or invalid token rejects the request with
/// `AppError::Authentication`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    JwtService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Missing bearer token".to_string()))?;

        let jwt_service = JwtService::from_ref(state);
        let claims = jwt_service.validate_token(&token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            e
        })?;

        Ok(AuthenticatedUser(claims.principal()))
    }
}

/// Extract JWT token from Authorization header
fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
