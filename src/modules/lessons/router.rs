use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::controller::{create_lesson, delete_lesson, get_lesson, list_lessons, update_lesson};
use crate::state::AppState;

pub fn init_lessons_router() -> Router<AppState> {
    Router::new()
        .route("/lessons/", get(list_lessons))
        .route("/lessons/create/", post(create_lesson))
        .route("/lessons/{id}/", get(get_lesson))
        .route("/lessons/{id}/update/", put(update_lesson).patch(update_lesson))
        .route("/lessons/{id}/delete/", delete(delete_lesson))
}
