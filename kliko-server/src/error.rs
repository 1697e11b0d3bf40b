use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kliko_core::QueryError;
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    Query(QueryError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self::Query(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Query(QueryError::InvalidRadius(radius)) => (
                StatusCode::BAD_REQUEST,
                format!("Parameter 'radius' must be a non-negative number, got {radius}"),
            ),
            ApiError::Query(QueryError::ReferenceNotFound(_)) => {
                (StatusCode::NOT_FOUND, "Container not found".to_owned())
            }
            ApiError::Query(
                err @ (QueryError::UpstreamUnavailable(_) | QueryError::UpstreamDataInvalid(_)),
            ) => {
                error!(error = %err, "query failed upstream");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch or parse script data".to_owned(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
