use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::notification::Mailer;
use crate::storage::FileStores;
use crate::utils::{Pool, handler_404, handler_405};
use crate::{contact, course, order, payment, product, user, user_course};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Pool,
    pub files: Arc<FileStores>,
    pub mailer: Mailer,
}

pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let api = Router::new()
        .merge(user::routes::get_routes())
        .merge(course::routes::get_routes())
        .merge(product::routes::get_routes())
        .merge(order::routes::get_routes())
        .merge(payment::routes::get_routes())
        .merge(user_course::routes::get_routes())
        .merge(contact::routes::get_routes())
        .method_not_allowed_fallback(handler_405);

    let mut app = Router::new()
        .nest("/api", api)
        .route("/health", get(health));

    for store in state.files.disk_buckets() {
        app = app.nest_service(&format!("/{}", store.bucket()), ServeDir::new(store.dir()));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.method_not_allowed_fallback(handler_405)
        .fallback(handler_404)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
