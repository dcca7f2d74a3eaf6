use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use lectern_core::{AppError, Paginated, PaginationParams};
use lectern_models::{CreatePaymentDto, Payment, PaymentFilterParams};

use super::service::PaymentService;
use crate::middleware::auth::CurrentActor;
use crate::modules::users::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List the caller's payments
///
/// Filters combine with AND. Results are ordered by `date_of_payment`,
/// oldest first unless `ordering=-date_of_payment`.
#[utoipa::path(
    get,
    path = "/users/payments/",
    params(PaymentFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Page of payments", body = Paginated<Payment>),
        (status = 400, description = "Malformed filter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<PaymentFilterParams>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Payment>>, AppError> {
    let page = PaymentService::list_payments(&state, actor, filter, params).await?;
    Ok(Json(page))
}

/// Record a payment made by the caller
#[utoipa::path(
    post,
    path = "/users/payment/create/",
    request_body = CreatePaymentDto,
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Course or lesson not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument(skip(state, dto))]
pub async fn create_payment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidatedJson(dto): ValidatedJson<CreatePaymentDto>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let payment = PaymentService::record_payment(&state, actor, dto).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}
