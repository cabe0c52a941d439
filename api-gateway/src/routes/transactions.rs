use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use ledger::{PoolError, Transaction, TxError};

use super::{ApiError, bad_request};
use crate::state::SharedState;

/// Request body for `POST /transactions`.
#[derive(Debug, Deserialize)]
pub struct SubmitTransactionRequest {
    /// Hex-encoded wire envelope (`Transaction::encode_wire`), signatures
    /// included.
    pub tx_hex: String,
}

/// Response body for `POST /transactions`.
#[derive(Debug, Serialize)]
pub struct SubmitTransactionResponse {
    pub status: &'static str,
    pub hash: String,
    pub voluntary_tip: f64,
    pub signature_failures: usize,
}

/// `POST /transactions`
///
/// Decodes, validates and pools a signed transaction. Its voluntary tip is
/// paid out at the next epoch.
pub async fn submit_transaction(
    State(state): State<SharedState>,
    Json(body): Json<SubmitTransactionRequest>,
) -> Result<(StatusCode, Json<SubmitTransactionResponse>), ApiError> {
    let wire = hex::decode(body.tx_hex.trim()).map_err(|_| bad_request("invalid hex encoding"))?;
    let tx = Transaction::decode_wire(&wire).map_err(|e| bad_request(e.to_string()))?;

    let start = Instant::now();
    let result = state.validator.validate(&state.validation_ctx, &tx);
    let failures = match &result {
        Ok(report) => report.signature_failures,
        Err(_) => 0,
    };
    state
        .metrics
        .ledger
        .observe_validation(start.elapsed(), result.is_ok(), failures);
    let report = result.map_err(rejection)?;

    let hash = report.hash;
    let voluntary_tip = tx.voluntary_tip();
    let signature_failures = report.signature_failures;
    {
        let mut pool = state.tx_pool.lock().await;
        pool.insert_validated(tx, report).map_err(pool_error)?;
    }
    tracing::info!(tx = %hash, voluntary_tip, "transaction pooled");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitTransactionResponse {
            status: "pooled",
            hash: hash.to_hex(),
            voluntary_tip,
            signature_failures,
        }),
    ))
}

fn rejection(e: TxError) -> ApiError {
    match e {
        TxError::Invalid(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("invalid transaction ({})", reason.label()),
        ),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

fn pool_error(e: PoolError) -> ApiError {
    match e {
        PoolError::Duplicate(_) => (StatusCode::CONFLICT, e.to_string()),
        PoolError::Full { .. } => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        PoolError::TipOverflow { .. } => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        PoolError::Rejected(inner) => rejection(inner),
    }
}
