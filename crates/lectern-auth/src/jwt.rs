//! JWT utilities for authentication.
//!
//! Access tokens are short-lived and authenticate API requests. Refresh tokens
//! are long-lived and can only be exchanged for a new token pair.
//!
//! Both are HS256 tokens signed with [`JwtConfig::secret`]. A `kind` claim keeps
//! one from being accepted in place of the other.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use lectern_config::JwtConfig;
use lectern_core::AppError;

use crate::claims::{Claims, RefreshTokenClaims, TokenKind};

/// Creates an access token for the given user.
///
/// # Errors
///
/// Returns an internal error if token encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        kind: TokenKind::Access,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns its claims.
///
/// # Errors
///
/// Returns an unauthorized error if the signature is invalid, the token has
/// expired, is malformed, or is not an access token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))?;

    if claims.kind != TokenKind::Access {
        return Err(AppError::unauthorized("Invalid or expired token".to_string()));
    }

    Ok(claims)
}

/// Creates a refresh token for obtaining new access tokens.
pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.refresh_token_expiry as usize;

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        kind: TokenKind::Refresh,
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

/// Verifies a refresh token and returns its claims.
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    let claims = decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token".to_string()))?;

    if claims.kind != TokenKind::Refresh {
        return Err(AppError::unauthorized(
            "Invalid or expired refresh token".to_string(),
        ));
    }

    Ok(claims)
}
