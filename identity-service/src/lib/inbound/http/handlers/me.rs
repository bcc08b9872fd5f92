use auth::Role;
use auth::SecurityContext;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;

/// Returns the principal the pipeline attached to this request.
pub async fn me(
    Extension(context): Extension<SecurityContext>,
) -> Result<ApiSuccess<MeResponseData>, ApiError> {
    let principal = context
        .principal()
        .ok_or_else(|| ApiError::unauthorized("Authentication required", "MISSING_TOKEN"))?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MeResponseData {
            username: principal.username.clone(),
            roles: principal.roles.iter().copied().collect(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeResponseData {
    pub username: String,
    pub roles: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use auth::Principal;

    use super::*;

    #[tokio::test]
    async fn test_me_returns_principal() {
        let context = SecurityContext::authenticated(Principal::new("alice", [Role::Admin]));

        let response = me(Extension(context)).await.unwrap();

        assert_eq!(
            response,
            ApiSuccess::new(
                StatusCode::OK,
                MeResponseData {
                    username: "alice".to_string(),
                    roles: vec![Role::Admin],
                }
            )
        );
    }

    #[tokio::test]
    async fn test_me_anonymous_rejected() {
        let result = me(Extension(SecurityContext::anonymous())).await;
        assert!(matches!(
            result,
            Err(ApiError::Unauthorized { code: "MISSING_TOKEN", .. })
        ));
    }
}
