use axum::Json;
use axum::extract::State;
use tracing::instrument;

use lectern_core::AppError;
use lectern_models::{ToggleSubscriptionDto, ToggleSubscriptionResponse};

use super::service::SubscriptionService;
use crate::middleware::auth::CurrentActor;
use crate::modules::users::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Subscribe to a course, or unsubscribe if already subscribed
#[utoipa::path(
    post,
    path = "/subscription/create/",
    request_body = ToggleSubscriptionDto,
    responses(
        (status = 200, description = "Subscription toggled", body = ToggleSubscriptionResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Subscriptions"
)]
#[instrument(skip(state, dto))]
pub async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidatedJson(dto): ValidatedJson<ToggleSubscriptionDto>,
) -> Result<Json<ToggleSubscriptionResponse>, AppError> {
    let outcome = SubscriptionService::toggle(
        state.courses.as_ref(),
        state.subscriptions.as_ref(),
        actor.id,
        dto.course,
    )
    .await?;

    Ok(Json(outcome.into()))
}
