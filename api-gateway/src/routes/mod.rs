pub mod health;
pub mod nodes;
pub mod rapid_table;
pub mod transactions;

use axum::http::StatusCode;

/// Error half of every handler's result.
pub type ApiError = (StatusCode, String);

pub(crate) fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.into())
}
