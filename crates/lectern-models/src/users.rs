//! User models, registration and login DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::UserId;

/// Name of the group whose members are moderators.
pub const MODERATOR_GROUP: &str = "Moderator";

/// A registered user. The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User row joined with its password hash, used only for login.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUserDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 35))]
    pub phone: Option<String>,
    #[validate(length(max = 35))]
    pub city: Option<String>,
}

/// Changes to the caller's own account. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 35))]
    pub phone: Option<String>,
    #[validate(length(max = 35))]
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// The authenticated user's profile. `is_moderator` reflects group
/// membership at the time of the request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub is_moderator: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let dto = RegisterUserDto {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            phone: None,
            city: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_update_user_validation() {
        let dto: UpdateUserDto = serde_json::from_str("{}").unwrap();
        assert!(dto.validate().is_ok());

        let dto = UpdateUserDto {
            email: Some("nope".to_string()),
            city: Some("x".repeat(36)),
            ..Default::default()
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("city"));
    }

    #[test]
    fn test_user_serialization_has_no_password() {
        let user = User {
            id: UserId::new(),
            email: "student@lectern.dev".to_string(),
            phone: None,
            city: Some("Kazan".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["city"], "Kazan");
    }
}
