use auth::AuthenticationError;
use auth::TokenError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::user::errors::UserError;

pub mod health;
pub mod list_users;
pub mod login;
pub mod me;
pub mod register;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized {
        message: String,
        code: &'static str,
    },
    Forbidden(String),
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Unauthorized { message, code } => {
                (StatusCode::UNAUTHORIZED, message, Some(code))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, Some("INSUFFICIENT_ROLE")),
        };

        let mut response =
            (status, Json(ApiResponseBody::new_error(status, message, code))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UsernameAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            UserError::InvalidCredentials => {
                ApiError::unauthorized(err.to_string(), "INVALID_CREDENTIALS")
            }
            UserError::InvalidUsername(_) | UserError::InvalidPassword(_) => {
                ApiError::BadRequest(err.to_string())
            }
            UserError::Password(_)
            | UserError::Token(_)
            | UserError::DatabaseError(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::EncodingFailed(_) => {
                ApiError::InternalServerError("Internal server error".to_string())
            }
            TokenError::Malformed(_) | TokenError::InvalidSignature | TokenError::Expired => {
                ApiError::unauthorized(err.to_string(), err.code())
            }
        }
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(err: AuthenticationError) -> Self {
        ApiError::from(UserError::from(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String, code: Option<&'static str>) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message, code },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::errors::UsernameError;

    #[test]
    fn test_user_error_mapping() {
        assert!(matches!(
            ApiError::from(UserError::UsernameAlreadyExists("alice".to_string())),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(UserError::InvalidUsername(UsernameError::InvalidCharacters)),
            ApiError::BadRequest(_)
        ));
        assert_eq!(
            ApiError::from(UserError::InvalidCredentials),
            ApiError::unauthorized("Invalid credentials", "INVALID_CREDENTIALS")
        );
        assert_eq!(
            ApiError::from(UserError::DatabaseError("password=hunter2".to_string())),
            ApiError::InternalServerError("Internal server error".to_string())
        );
    }

    #[test]
    fn test_token_error_mapping() {
        assert_eq!(
            ApiError::from(TokenError::Expired),
            ApiError::unauthorized("Token is expired", "TOKEN_EXPIRED")
        );
        assert!(matches!(
            ApiError::from(TokenError::InvalidSignature),
            ApiError::Unauthorized { code: "INVALID_SIGNATURE", .. }
        ));
    }

    #[test]
    fn test_unauthorized_response_status() {
        let response = ApiError::from(TokenError::Expired).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(axum::http::header::WWW_AUTHENTICATE),
            Some(&axum::http::HeaderValue::from_static("Bearer"))
        );
    }
}
