use axum::http::StatusCode;
use serde::Serialize;

use super::ApiSuccess;

pub async fn health() -> ApiSuccess<HealthResponseData> {
    ApiSuccess::new(StatusCode::OK, HealthResponseData { status: "ok" })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponseData {
    pub status: &'static str,
}
