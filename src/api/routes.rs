//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Account, EntryType, OperationContext};
use crate::error::AppError;
use crate::handlers::{
    BalanceHandler, CashCommand, CashHandler, RegisterAccountCommand, RegisterAccountHandler,
};

use super::middleware::{context_middleware, logging_middleware};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub nama: String,
    #[serde(default)]
    pub nik: String,
    #[serde(default)]
    pub no_hp: String,
}

impl From<RegisterRequest> for RegisterAccountCommand {
    fn from(request: RegisterRequest) -> Self {
        RegisterAccountCommand::new(request.nama, request.nik, request.no_hp)
    }
}

/// Body shared by `POST /tabung` and `POST /tarik`
#[derive(Debug, Serialize, Deserialize)]
pub struct CashRequest {
    #[serde(default)]
    pub no_rekening: String,
    /// Missing amounts fail validation as zero
    #[serde(default)]
    pub nominal: Decimal,
    #[serde(default)]
    pub keterangan: Option<String>,
}

impl From<CashRequest> for CashCommand {
    fn from(request: CashRequest) -> Self {
        let command = CashCommand::new(request.no_rekening, request.nominal);
        match request.keterangan {
            Some(description) => command.with_description(description),
            None => command,
        }
    }
}

/// Registered account as returned by `POST /daftar`
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    #[serde(rename = "no_rekening")]
    pub account_number: String,
    #[serde(rename = "nama")]
    pub full_name: String,
    #[serde(rename = "nik")]
    pub id_number: String,
    #[serde(rename = "no_hp")]
    pub phone_number: String,
    #[serde(rename = "saldo")]
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_number: account.account_number,
            full_name: account.full_name,
            id_number: account.id_number,
            phone_number: account.phone_number,
            balance: account.balance,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    #[serde(rename = "saldo")]
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
///
/// Every route runs behind the correlation context middleware, so handlers
/// can always extract an [`OperationContext`]. Request logging sits inside
/// it and sees the correlation id.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/daftar", post(register))
        .route("/tabung", post(deposit))
        .route("/tarik", post(withdraw))
        .route("/saldo/:no_rekening", get(balance))
        .route("/health-check", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(context_middleware))
}

fn body<T, C>(payload: Result<Json<T>, JsonRejection>) -> Result<C, AppError>
where
    T: Into<C>,
{
    payload
        .map(|Json(value)| value.into())
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

// =========================================================================
// POST /daftar
// =========================================================================

/// Register a new account
async fn register(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let command: RegisterAccountCommand = body(payload)?;
    let handler = RegisterAccountHandler::new(state.store, state.generator);

    let account = handler.execute(command, &context).await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

// =========================================================================
// POST /tabung, POST /tarik
// =========================================================================

/// Deposit cash
async fn deposit(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<CashRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    cash(state, context, EntryType::Credit, payload).await
}

/// Withdraw cash
async fn withdraw(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<CashRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    cash(state, context, EntryType::Debit, payload).await
}

async fn cash(
    state: AppState,
    context: OperationContext,
    entry_type: EntryType,
    payload: Result<Json<CashRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let command: CashCommand = body(payload)?;
    let handler = CashHandler::new(state.store);

    let result = match entry_type {
        EntryType::Credit => handler.deposit(command, &context).await?,
        EntryType::Debit => handler.withdraw(command, &context).await?,
    };

    Ok(Json(BalanceResponse {
        balance: result.balance(),
    }))
}

// =========================================================================
// GET /saldo/:no_rekening
// =========================================================================

/// Get the current balance of an account
async fn balance(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<BalanceResponse>, AppError> {
    let Path(account_number) =
        path.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let handler = BalanceHandler::new(state.store);
    let account = handler.execute(&account_number).await?;

    Ok(Json(BalanceResponse {
        balance: account.balance,
    }))
}

// =========================================================================
// GET /health-check
// =========================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                }),
            )
        }
    }
}
