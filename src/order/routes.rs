use axum::{
    Router,
    routing::{get, put},
};

use super::handlers;
use crate::app::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(handlers::get_orders).post(handlers::create_order))
        .route(
            "/orders/{id}",
            get(handlers::get_order_by_id)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/orders/email/{email}", get(handlers::get_orders_by_email))
        .route("/orders/owner/{email}", get(handlers::get_orders_by_owner))
        .route("/orders/status/{id}", put(handlers::update_order_status))
}
