use axum::{Router, routing::get};

use super::handlers;
use crate::app::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/contacts",
            get(handlers::get_contacts).post(handlers::create_contact),
        )
        .route(
            "/contacts/{id}",
            get(handlers::get_contact_by_id).delete(handlers::delete_contact),
        )
}
