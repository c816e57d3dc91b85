use actix_web::{http::StatusCode, HttpResponse};
use labpanic_core::ScoreError;

/// `{"error": {"code", "message"}}`
pub(crate) fn json_error_with_code(
    status: StatusCode,
    message: impl Into<String>,
    error_code: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": {
            "code": error_code,
            "message": message.into(),
        }
    }))
}

pub(crate) fn status_for(err: &ScoreError) -> StatusCode {
    match err {
        ScoreError::InvalidSession | ScoreError::SessionExpired => StatusCode::UNAUTHORIZED,
        ScoreError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ScoreError::InvalidPlatform
        | ScoreError::MissingFields
        | ScoreError::InvalidName
        | ScoreError::InvalidScore
        | ScoreError::InvalidScope => StatusCode::BAD_REQUEST,
    }
}

/// Storage details are logged here and never reach the client.
pub(crate) fn score_error_response(err: &ScoreError) -> HttpResponse {
    if let ScoreError::StorageFailure(detail) = err {
        tracing::error!(error_code = err.code(), "storage failure: {detail}");
    }
    json_error_with_code(status_for(err), err.public_message(), err.code())
}
