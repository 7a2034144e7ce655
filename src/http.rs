//! HTTP boundary for the account service.
//!
//! Resolves method and path to a service operation, parses identifiers and
//! request bodies before the service is called, and renders results as JSON.
//! Service calls are blocking file I/O and run on the blocking thread pool.

use crate::account::Account;
use crate::error::LedgerError;
use crate::service::AccountService;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Service handle shared by all handlers.
pub type SharedService = Arc<AccountService>;

/// Errors surfaced by the HTTP layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The blocking task running the operation did not complete
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(LedgerError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Ledger(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            warn!("Request rejected ({}): {}", status, self);
        } else {
            error!("Request failed ({}): {}", status, self);
        }
        error_response(status, self.to_string())
    }
}

/// Error payload: `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Optional body of a create request. Omitted names are stored empty.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Body of an adjust-balance request; `amount` is a signed delta.
#[derive(Debug, Deserialize)]
pub struct AdjustBalanceRequest {
    pub amount: i64,
}

/// Payload returned after a successful delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: u64,
    pub deleted: bool,
}

/// Builds the router exposing the four account operations.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/account", post(create_account))
        .route("/account/{id}", get(get_account).delete(delete_account))
        .route("/account/{id}/balance", patch(adjust_balance))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(service)
}

async fn create_account(
    State(service): State<SharedService>,
    body: Bytes,
) -> Result<Json<Account>, ApiError> {
    let request: CreateAccountRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateAccountRequest::default()
    } else {
        parse_body(&body)?
    };

    let account = run_blocking(service, move |s| {
        s.create(&request.first_name, &request.last_name)
    })
    .await?;
    Ok(Json(account))
}

async fn get_account(
    State(service): State<SharedService>,
    Path(raw_id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let id = parse_id(&raw_id)?;
    let account = run_blocking(service, move |s| s.get(id)).await?;
    Ok(Json(account))
}

async fn adjust_balance(
    State(service): State<SharedService>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Account>, ApiError> {
    let id = parse_id(&raw_id)?;
    let request: AdjustBalanceRequest = parse_body(&body)?;

    let account = run_blocking(service, move |s| s.adjust_balance(id, request.amount)).await?;
    Ok(Json(account))
}

async fn delete_account(
    State(service): State<SharedService>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    run_blocking(service, move |s| s.delete(id)).await?;
    Ok(Json(DeleteResponse { id, deleted: true }))
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "no such route")
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Parses a path identifier. Identifiers are positive integers.
pub fn parse_id(raw: &str) -> Result<u64, LedgerError> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(LedgerError::InvalidArgument(format!(
            "invalid account ID: {}",
            raw
        ))),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, LedgerError> {
    serde_json::from_slice(body)
        .map_err(|e| LedgerError::InvalidArgument(format!("could not decode request body: {}", e)))
}

async fn run_blocking<T, F>(service: SharedService, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AccountService) -> crate::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}
