use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use lectern_core::{AppError, Paginated, PaginationParams};
use lectern_models::{CreateLessonDto, Lesson, LessonId, UpdateLessonDto};

use super::service::LessonService;
use crate::middleware::auth::CurrentActor;
use crate::modules::users::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List lessons visible to the caller
#[utoipa::path(
    get,
    path = "/lessons/",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of lessons", body = Paginated<Lesson>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn list_lessons(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Lesson>>, AppError> {
    let page = LessonService::list_lessons(&state, actor, params).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/lessons/{id}/",
    params(("id" = LessonId, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Lesson", body = Lesson),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn get_lesson(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<LessonId>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = LessonService::get_lesson(&state, actor, id).await?;
    Ok(Json(lesson))
}

/// Create a lesson owned by the caller
#[utoipa::path(
    post,
    path = "/lessons/create/",
    request_body = CreateLessonDto,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Moderators cannot create lessons", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, dto))]
pub async fn create_lesson(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidatedJson(dto): ValidatedJson<CreateLessonDto>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = LessonService::create_lesson(&state, actor, dto).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Update a lesson (PUT and PATCH are both partial)
#[utoipa::path(
    patch,
    path = "/lessons/{id}/update/",
    params(("id" = LessonId, Path, description = "Lesson ID")),
    request_body = UpdateLessonDto,
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not allowed to update this lesson", body = ErrorResponse),
        (status = 404, description = "Lesson or target course not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state, dto))]
pub async fn update_lesson(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<LessonId>,
    ValidatedJson(dto): ValidatedJson<UpdateLessonDto>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = LessonService::update_lesson(&state, actor, id, dto).await?;
    Ok(Json(lesson))
}

#[utoipa::path(
    delete,
    path = "/lessons/{id}/delete/",
    params(("id" = LessonId, Path, description = "Lesson ID")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not allowed to delete this lesson", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn delete_lesson(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<LessonId>,
) -> Result<StatusCode, AppError> {
    LessonService::delete_lesson(&state, actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
