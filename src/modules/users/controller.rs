use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use lectern_core::{AppError, Paginated, PaginationParams};
use lectern_models::{
    LoginRequest, LoginResponse, ProfileResponse, RefreshTokenRequest, RegisterUserDto,
    TokenResponse, UpdateUserDto, User, UserId,
};

use super::service::UserService;
use crate::middleware::auth::CurrentActor;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users/register/",
    request_body = RegisterUserDto,
    responses(
        (status = 201, description = "User registered successfully", body = User),
        (status = 400, description = "Malformed body or email already exists", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::register_user(state.users.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login and receive an access/refresh token pair
#[utoipa::path(
    post,
    path = "/users/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = UserService::login_user(state.users.as_ref(), dto, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/users/token/refresh/",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response =
        UserService::refresh_tokens(state.users.as_ref(), dto, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/users/me/",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = UserService::get_profile(state.users.as_ref(), actor).await?;
    Ok(Json(profile))
}

/// List accounts visible to the caller
///
/// The only visible account is the caller's own.
#[utoipa::path(
    get,
    path = "/users/user/",
    params(PaginationParams),
    responses(
        (status = 200, description = "The caller's account", body = Paginated<User>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<User>>, AppError> {
    let page = UserService::list_users(state.users.as_ref(), actor, params).await?;
    Ok(Json(page))
}

/// Get the caller's account
#[utoipa::path(
    get,
    path = "/users/user/{id}/",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(state.users.as_ref(), actor, id).await?;
    Ok(Json(user))
}

/// Update the caller's account
///
/// PUT and PATCH both apply only the fields present in the body.
#[utoipa::path(
    patch,
    path = "/users/user/{id}/",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Malformed body or email already exists", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update_user(state.users.as_ref(), actor, id, dto).await?;
    Ok(Json(user))
}

/// Delete the caller's account
#[utoipa::path(
    delete,
    path = "/users/user/{id}/",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(state.users.as_ref(), actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
