use anyhow::anyhow;
use tracing::{debug, info, instrument};

use lectern_access::{Actor, Scope};
use lectern_core::{AppError, Paginated, PaginationParams};
use lectern_models::{CreatePaymentDto, Payment, PaymentFilterParams};

use crate::metrics::track_payment_recorded;
use crate::state::AppState;

pub struct PaymentService;

impl PaymentService {
    /// Records a payment for the caller. Nothing is charged; the row is the
    /// whole effect.
    #[instrument(skip(state, dto), fields(payment.method = %dto.payment_method))]
    pub async fn record_payment(
        state: &AppState,
        actor: Actor,
        dto: CreatePaymentDto,
    ) -> Result<Payment, AppError> {
        if let Some(course) = dto.paid_course
            && !state.courses.course_exists(course).await?
        {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }
        if let Some(lesson) = dto.paid_lesson
            && state.lessons.find_lesson(lesson, Scope::All).await?.is_none()
        {
            return Err(AppError::not_found(anyhow!("Lesson not found")));
        }

        let payment = state.payments.insert_payment(actor.id, &dto).await?;
        track_payment_recorded(payment.payment_method);
        info!(
            payment.id = %payment.id,
            user.id = %actor.id,
            amount = payment.payment_amount,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// The caller's payments. Other users' payments are never visible,
    /// moderators included.
    #[instrument(skip(state, filter, params), fields(page = params.page(), page_size = params.page_size()))]
    pub async fn list_payments(
        state: &AppState,
        actor: Actor,
        filter: PaymentFilterParams,
        params: PaginationParams,
    ) -> Result<Paginated<Payment>, AppError> {
        let (payments, total) = state
            .payments
            .list_payments(actor.id, &filter, &params)
            .await?;
        debug!(total, returned = payments.len(), "Listed payments");

        Ok(Paginated::new(payments, &params, total))
    }
}
