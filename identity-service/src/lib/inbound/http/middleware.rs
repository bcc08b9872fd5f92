use auth::AuthenticationManager;
use auth::Credentials;
use auth::Decision;
use auth::SecurityContext;
use auth::TokenError;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;

use super::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Parsed `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthorizationHeader<'a> {
    Bearer(&'a str),
    Basic(&'a str),
}

fn authorization_header(headers: &HeaderMap) -> Result<Option<AuthorizationHeader<'_>>, TokenError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| TokenError::Malformed("authorization header is not valid ASCII".to_string()))?;

    let (scheme, credentials) = value.split_once(' ').unwrap_or((value, ""));
    let credentials = credentials.trim();

    if scheme.eq_ignore_ascii_case("bearer") {
        if credentials.is_empty() {
            return Err(TokenError::Malformed("empty bearer token".to_string()));
        }
        Ok(Some(AuthorizationHeader::Bearer(credentials)))
    } else if scheme.eq_ignore_ascii_case("basic") {
        Ok(Some(AuthorizationHeader::Basic(credentials)))
    } else {
        Ok(None)
    }
}

fn decode_basic(encoded: &str) -> Option<Credentials> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials::new(username, password))
}

/// Token validation stage.
///
/// Attaches a `SecurityContext` to every request: authenticated when a valid
/// bearer token is present, anonymous when no bearer token was sent. A bearer
/// token that fails validation ends the request with 401.
pub async fn bearer_token_filter(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match authorization_header(req.headers()) {
        Ok(Some(AuthorizationHeader::Bearer(token))) => Some(token),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(code = e.code(), "Rejected authorization header");
            return Err(ApiError::from(e));
        }
    };

    let context = match token {
        Some(token) => {
            let claims = state.token_codec.validate(token, Utc::now()).map_err(|e| {
                tracing::warn!(code = e.code(), "JWT validation failed");
                ApiError::from(e)
            })?;
            SecurityContext::authenticated(claims.principal())
        }
        None => SecurityContext::anonymous(),
    };

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// HTTP Basic stage.
///
/// Only consulted while the context is still anonymous.
pub async fn basic_credentials_filter(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let anonymous = req
        .extensions()
        .get::<SecurityContext>()
        .map_or(true, |context| !context.is_authenticated());

    let basic = match authorization_header(req.headers()) {
        Ok(Some(AuthorizationHeader::Basic(encoded))) if anonymous => {
            Some(decode_basic(encoded).ok_or_else(|| {
                tracing::warn!("Malformed basic credentials");
                ApiError::unauthorized("Invalid credentials", "INVALID_CREDENTIALS")
            }))
        }
        _ => None,
    };

    if let Some(credentials) = basic {
        let credentials = credentials?;
        let principal = state
            .authentication_manager
            .authenticate(&credentials)
            .await
            .map_err(|e| {
                tracing::warn!(username = %credentials.username, error = %e, "Basic authentication failed");
                ApiError::from(e)
            })?;

        req.extensions_mut()
            .insert(SecurityContext::authenticated(principal));
    }

    Ok(next.run(req).await)
}

/// Authorization stage: applies the policy to the request path.
pub async fn authorize(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = req
        .extensions()
        .get::<SecurityContext>()
        .cloned()
        .unwrap_or_default();

    let decision = state
        .authorization_policy
        .evaluate(req.uri().path(), &context);

    match decision {
        Decision::Allow => {
            req.extensions_mut().insert(context);
            Ok(next.run(req).await)
        }
        Decision::Unauthenticated => Err(ApiError::unauthorized(
            "Authentication required",
            "MISSING_TOKEN",
        )),
        Decision::Forbidden(role) => {
            tracing::warn!(path = %req.uri().path(), required = %role, "Access denied");
            Err(ApiError::Forbidden(format!("Requires role {role}")))
        }
    }
}
