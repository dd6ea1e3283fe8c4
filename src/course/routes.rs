use axum::{Router, routing::get};

use super::handlers;
use crate::app::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/courses",
            get(handlers::get_courses).post(handlers::create_course),
        )
        .route(
            "/courses/{id}",
            get(handlers::get_course_by_id)
                .put(handlers::update_course)
                .delete(handlers::delete_course),
        )
}
