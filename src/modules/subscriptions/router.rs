use axum::{Router, routing::post};

use super::controller::toggle_subscription;
use crate::state::AppState;

pub fn init_subscriptions_router() -> Router<AppState> {
    Router::new().route("/subscription/create/", post(toggle_subscription))
}
