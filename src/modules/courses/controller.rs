use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use lectern_core::{AppError, Paginated, PaginationParams};
use lectern_models::{CourseId, CourseResponse, CreateCourseDto, UpdateCourseDto};

use super::service::CourseService;
use crate::middleware::auth::CurrentActor;
use crate::modules::users::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List courses visible to the caller
///
/// Moderators see every course, everyone else only their own.
#[utoipa::path(
    get,
    path = "/course/",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of courses", body = Paginated<CourseResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<CourseResponse>>, AppError> {
    let page = CourseService::list_courses(&state, actor, params).await?;
    Ok(Json(page))
}

/// Create a course owned by the caller
#[utoipa::path(
    post,
    path = "/course/",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Moderators cannot create courses", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let course = CourseService::create_course(&state, actor, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// Get a course with its lessons
#[utoipa::path(
    get,
    path = "/course/{id}/",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = CourseResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<CourseId>,
) -> Result<Json<CourseResponse>, AppError> {
    let course = CourseService::get_course(&state, actor, id).await?;
    Ok(Json(course))
}

/// Update a course
///
/// PUT and PATCH both apply only the fields present in the body.
#[utoipa::path(
    patch,
    path = "/course/{id}/",
    params(("id" = CourseId, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not allowed to update this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<CourseResponse>, AppError> {
    let course = CourseService::update_course(&state, actor, id, dto).await?;
    Ok(Json(course))
}

/// Delete a course
#[utoipa::path(
    delete,
    path = "/course/{id}/",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not allowed to delete this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<CourseId>,
) -> Result<StatusCode, AppError> {
    CourseService::delete_course(&state, actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
