use axum::{Router, routing::get};

use super::handlers;
use crate::app::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/payments",
            get(handlers::get_payments).post(handlers::create_payment),
        )
        .route(
            "/payments/{id}",
            get(handlers::get_payment_by_id)
                .put(handlers::update_payment)
                .delete(handlers::delete_payment),
        )
        .route("/payments/email/{email}", get(handlers::get_payments_by_email))
}
