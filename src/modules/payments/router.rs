use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{create_payment, list_payments};
use crate::state::AppState;

pub fn init_payments_router() -> Router<AppState> {
    Router::new()
        .route("/users/payments/", get(list_payments))
        .route("/users/payment/create", post(create_payment))
        .route("/users/payment/create/", post(create_payment))
}
