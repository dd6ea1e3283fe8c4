use axum::{Router, routing::get};

use super::handlers;
use crate::app::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new().route(
        "/userCourses/email/{email}",
        get(handlers::get_user_courses),
    )
}
