use std::sync::Arc;
use std::time::Duration;

use auth::AuthenticationManager;
use auth::AuthorizationPolicy;
use auth::TokenCodec;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::health::health;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::me::me;
use super::handlers::not_found;
use super::handlers::register::register;
use super::middleware::authorize;
use super::middleware::basic_credentials_filter;
use super::middleware::bearer_token_filter;
use crate::domain::user::ports::AuthServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub authentication_manager: Arc<dyn AuthenticationManager>,
    pub token_codec: Arc<TokenCodec>,
    pub authorization_policy: Arc<AuthorizationPolicy>,
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    authentication_manager: Arc<dyn AuthenticationManager>,
    token_codec: Arc<TokenCodec>,
    authorization_policy: Arc<AuthorizationPolicy>,
) -> Router {
    let state = AppState {
        auth_service,
        authentication_manager,
        token_codec,
        authorization_policy,
    };

    // Runs top to bottom for every request, including the fallback.
    let security_chain = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_token_filter,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            basic_credentials_filter,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), authorize));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/health", get(health))
        .route("/me", get(me))
        .route("/users", get(list_users))
        .fallback(not_found)
        .layer(security_chain)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
