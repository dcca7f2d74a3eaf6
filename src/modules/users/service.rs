use anyhow::anyhow;
use tracing::{info, instrument, warn};

use lectern_access::Actor;
use lectern_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use lectern_config::JwtConfig;
use lectern_core::{AppError, Paginated, PaginationParams, hash_password, verify_password};
use lectern_models::{
    LoginRequest, LoginResponse, ProfileResponse, RefreshTokenRequest, RegisterUserDto,
    TokenResponse, UpdateUserDto, User, UserId,
};

use crate::metrics::{
    track_jwt_issued, track_user_deleted, track_user_login_failure, track_user_login_success,
    track_user_registered,
};
use crate::store::{NewUser, UserRepository};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct UserService;

impl UserService {
    #[instrument(skip(users, dto), fields(user.email = %dto.email))]
    pub async fn register_user(
        users: &dyn UserRepository,
        dto: RegisterUserDto,
    ) -> Result<User, AppError> {
        let password_hash = hash_password(&dto.password)?;

        let user = users
            .insert_user(NewUser {
                email: dto.email,
                password_hash,
                phone: dto.phone,
                city: dto.city,
            })
            .await?
            .ok_or_else(|| {
                warn!("Registration with existing email");
                AppError::bad_request(anyhow!("Email already exists"))
            })?;

        track_user_registered();
        info!(user.id = %user.id, "User registered");

        Ok(user)
    }

    #[instrument(skip(users, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn login_user(
        users: &dyn UserRepository,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let Some(credentials) = users.find_credentials_by_email(&dto.email).await? else {
            track_user_login_failure("unknown_email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&dto.password, &credentials.password)? {
            track_user_login_failure("wrong_password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = credentials.user;
        let (access_token, refresh_token) = Self::issue_tokens(&user, jwt_config)?;

        track_user_login_success();
        info!(user.id = %user.id, "User logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user,
        })
    }

    /// Exchanges a refresh token for a new token pair. The user must still exist.
    #[instrument(skip_all)]
    pub async fn refresh_tokens(
        users: &dyn UserRepository,
        dto: RefreshTokenRequest,
        jwt_config: &JwtConfig,
    ) -> Result<TokenResponse, AppError> {
        let claims = verify_refresh_token(&dto.refresh_token, jwt_config)?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid or expired refresh token".to_string()))?;

        let user = users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token".to_string()))?;

        let (access_token, refresh_token) = Self::issue_tokens(&user, jwt_config)?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }

    #[instrument(skip(users))]
    pub async fn get_profile(
        users: &dyn UserRepository,
        actor: Actor,
    ) -> Result<ProfileResponse, AppError> {
        let user = users
            .find_user(actor.id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        Ok(ProfileResponse {
            user,
            is_moderator: actor.is_moderator,
        })
    }

    /// Account listing. Every caller sees exactly one row: their own.
    #[instrument(skip(users, params))]
    pub async fn list_users(
        users: &dyn UserRepository,
        actor: Actor,
        params: PaginationParams,
    ) -> Result<Paginated<User>, AppError> {
        let own: Vec<User> = users.find_user(actor.id).await?.into_iter().collect();
        let total = own.len() as i64;
        let data = own
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.page_size() as usize)
            .collect();

        Ok(Paginated::new(data, &params, total))
    }

    /// Another user's id is reported as missing.
    fn ensure_self(actor: &Actor, id: UserId) -> Result<(), AppError> {
        if actor.id != id {
            return Err(AppError::not_found(anyhow!("User not found")));
        }
        Ok(())
    }

    #[instrument(skip(users))]
    pub async fn get_user(
        users: &dyn UserRepository,
        actor: Actor,
        id: UserId,
    ) -> Result<User, AppError> {
        Self::ensure_self(&actor, id)?;
        users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(users, dto))]
    pub async fn update_user(
        users: &dyn UserRepository,
        actor: Actor,
        id: UserId,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        Self::ensure_self(&actor, id)?;
        let user = users
            .update_user(id, &dto)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;
        info!(user.id = %user.id, "User updated");

        Ok(user)
    }

    /// Deletes the caller's account along with their courses, lessons,
    /// subscriptions and payments.
    #[instrument(skip(users))]
    pub async fn delete_user(
        users: &dyn UserRepository,
        actor: Actor,
        id: UserId,
    ) -> Result<(), AppError> {
        Self::ensure_self(&actor, id)?;
        if !users.delete_user(id).await? {
            return Err(AppError::not_found(anyhow!("User not found")));
        }
        track_user_deleted();
        info!(user.id = %id, "User deleted");

        Ok(())
    }

    fn issue_tokens(user: &User, jwt_config: &JwtConfig) -> Result<(String, String), AppError> {
        let access_token = create_access_token(user.id.into_inner(), &user.email, jwt_config)?;
        let refresh_token = create_refresh_token(user.id.into_inner(), &user.email, jwt_config)?;
        track_jwt_issued();
        Ok((access_token, refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "service-test-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 7200,
        }
    }

    fn register_dto(email: &str) -> RegisterUserDto {
        RegisterUserDto {
            email: email.to_string(),
            password: "correct-horse".to_string(),
            phone: None,
            city: Some("Lisbon".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let user = UserService::register_user(&store, register_dto("reader@lectern.dev"))
            .await
            .unwrap();
        assert_eq!(user.city.as_deref(), Some("Lisbon"));

        let response = UserService::login_user(
            &store,
            LoginRequest {
                email: "reader@lectern.dev".to_string(),
                password: "correct-horse".to_string(),
            },
            &jwt_config(),
        )
        .await
        .unwrap();
        assert_eq!(response.user.id, user.id);
        assert!(!response.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let store = MemoryStore::new();
        UserService::register_user(&store, register_dto("dup@lectern.dev"))
            .await
            .unwrap();
        let err = UserService::register_user(&store, register_dto("dup@lectern.dev"))
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let store = MemoryStore::new();
        UserService::register_user(&store, register_dto("known@lectern.dev"))
            .await
            .unwrap();

        let wrong_password = UserService::login_user(
            &store,
            LoginRequest {
                email: "known@lectern.dev".to_string(),
                password: "nope-nope".to_string(),
            },
            &jwt_config(),
        )
        .await
        .unwrap_err();
        let unknown = UserService::login_user(
            &store,
            LoginRequest {
                email: "ghost@lectern.dev".to_string(),
                password: "nope-nope".to_string(),
            },
            &jwt_config(),
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.status.as_u16(), 401);
        assert_eq!(unknown.status.as_u16(), 401);
        assert_eq!(wrong_password.error.to_string(), unknown.error.to_string());
    }

    #[tokio::test]
    async fn test_account_operations_are_limited_to_self() {
        let store = MemoryStore::new();
        let alice = UserService::register_user(&store, register_dto("alice@lectern.dev"))
            .await
            .unwrap();
        let bob = UserService::register_user(&store, register_dto("bob@lectern.dev"))
            .await
            .unwrap();
        let as_alice = Actor::new(alice.id, false);
        let as_moderator = Actor::new(bob.id, true);

        let page = UserService::list_users(&store, as_alice, PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].id, alice.id);

        let err = UserService::get_user(&store, as_moderator, alice.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = UserService::delete_user(&store, as_moderator, alice.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.find_user(alice.id).await.unwrap().is_some());

        UserService::delete_user(&store, as_alice, alice.id)
            .await
            .unwrap();
        let err = UserService::get_user(&store, as_alice, alice.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let store = MemoryStore::new();
        let user = UserService::register_user(&store, register_dto("refresh@lectern.dev"))
            .await
            .unwrap();
        let config = jwt_config();
        let access = create_access_token(user.id.into_inner(), &user.email, &config).unwrap();
        let refresh = create_refresh_token(user.id.into_inner(), &user.email, &config).unwrap();

        let err = UserService::refresh_tokens(
            &store,
            RefreshTokenRequest {
                refresh_token: access,
            },
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status.as_u16(), 401);

        let tokens = UserService::refresh_tokens(
            &store,
            RefreshTokenRequest {
                refresh_token: refresh,
            },
            &config,
        )
        .await
        .unwrap();
        assert!(!tokens.refresh_token.is_empty());
    }
}
