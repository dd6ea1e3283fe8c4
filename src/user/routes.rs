use axum::{
    Router,
    routing::{get, post, put},
};

use super::handlers;
use crate::app::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(handlers::get_all_users).post(handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user_by_id)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users/login", post(handlers::login_user))
        .route("/users/forgot-password", post(handlers::forgot_password))
        .route("/users/reset-password", post(handlers::reset_password))
        .route("/users/qrcode/{email}", get(handlers::get_qrcode_by_email))
        .route("/users/update-qrcode/{id}", put(handlers::update_qrcode))
}
