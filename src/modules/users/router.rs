use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    delete_user, get_profile, get_user, list_users, login_user, refresh_token, register_user,
    update_user,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/users/register/", post(register_user))
        .route("/users/login/", post(login_user))
        .route("/users/token/refresh/", post(refresh_token))
        .route("/users/me/", get(get_profile))
        .route("/users/user/", get(list_users))
        .route(
            "/users/user/{id}/",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}
