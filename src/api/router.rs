use std::sync::Arc;

use axum::http::header;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_http::ServiceBuilderExt;

use super::handlers;
use super::types::AppState;

pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(handlers::core::routes())
        .merge(handlers::admins::routes())
        .merge(handlers::classes::routes())
        .merge(handlers::subjects::routes())
        .merge(handlers::students::routes())
        .merge(handlers::attendance::routes())
        .merge(handlers::exams::routes())
        .merge(handlers::teachers::routes())
        .merge(handlers::notices::routes())
        .fallback(handlers::core::handle_unknown)
        .with_state(state);

    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(TraceLayer::new_for_http())
        .sensitive_response_headers(sensitive_headers)
        .layer(CorsLayer::permissive());

    router.layer(middleware)
}
