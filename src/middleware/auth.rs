use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use lectern_access::Actor;
use lectern_auth::{Claims, verify_token};
use lectern_core::AppError;
use lectern_models::UserId;

use crate::state::AppState;

/// Extractor that validates the bearer JWT and provides its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// The authenticated [`Actor`] for this request.
///
/// Moderator status comes from the role directory on every request, never
/// from the token, so revoking the role takes effect on the next call.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        let user_id = auth_user.user_id()?;
        let is_moderator = state.roles.is_moderator(user_id).await?;

        Ok(CurrentActor(Actor::new(user_id, is_moderator)))
    }
}
