use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use mdlens_core::LensError;

#[expect(
    clippy::needless_pass_by_value,
    reason = "handlers naturally own error values from `Result` and pass them through"
)]
pub fn lens_error_response(err: LensError, operation: &str, uri: Option<String>) -> Response {
    let status = status_for_lens_error(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, operation, "request failed");
    } else {
        tracing::debug!(error = %err, operation, "request rejected");
    }
    (status, Json(err.to_payload(operation, uri))).into_response()
}

fn status_for_lens_error(err: &LensError) -> StatusCode {
    match err {
        LensError::Validation(_) => StatusCode::BAD_REQUEST,
        LensError::PathTraversal(_) | LensError::NotADocument(_) => StatusCode::FORBIDDEN,
        LensError::NotFound(_) => StatusCode::NOT_FOUND,
        LensError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
