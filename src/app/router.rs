use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{
    api::http::comments as comments_http,
    app::{middleware::security_headers, state::AppState},
    auth::middleware::auth_middleware,
    error::AppError,
    telemetry::request_logging_middleware,
};

pub fn build_router(state: AppState, cors_origin: &str) -> Result<Router, AppError> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .map_err(|err| AppError::Internal(format!("invalid CORS origin: {}", err)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let public_routes = Router::new().route(
        "/api/posts/{post_id}/comments",
        get(comments_http::get_post_comments_handle),
    );

    let authenticated_routes = Router::new()
        .route(
            "/api/posts/{post_id}/comments",
            post(comments_http::create_post_comment_handle),
        )
        .route(
            "/api/posts/{post_id}/comments/{comment_id}/replies",
            post(comments_http::create_comment_reply_handle),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Ok(Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(cors)
        .with_state(state))
}
