//! Bloga：带关注关系和版本化 REST API 的博客平台

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use crate::{
    state::AppState,
    utils::middleware::{auth_middleware, rate_limit_middleware, request_id_middleware},
};
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// 构建完整的应用路由
pub fn build_router(state: Arc<AppState>) -> Router {
    // 配置 CORS
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(
            state
                .config
                .cors_allowed_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        );

    let auth_routes = routes::auth::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit_middleware,
    ));

    Router::new()
        .route("/", get(routes::root::health_check))
        .route("/health", get(routes::root::health_check))
        .route("/api", get(routes::root::api_root))
        .nest("/api/auth", auth_routes)
        .nest("/api/v1", routes::v1_router())
        .nest("/api/v2", routes::v2_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
