//! Transaction API endpoints.

use api_types::transaction::{
    ExpenseNew, IncomeNew, TransactionCreated, TransactionKind as ApiKind, TransactionListQuery,
    TransactionListResponse, TransactionUpdate, TransactionView, TransferNew, WalletRefView,
    WalletRole as ApiRole,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};
use ledger::{Money, format_amount};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user, wallets::utc_offset};

const DEFAULT_PAGE_SIZE: u64 = 50;

fn kind_out(kind: ledger::TransactionKind) -> ApiKind {
    match kind {
        ledger::TransactionKind::Income => ApiKind::Income,
        ledger::TransactionKind::Expense => ApiKind::Expense,
        ledger::TransactionKind::Transfer => ApiKind::Transfer,
    }
}

fn role_out(role: ledger::WalletRole) -> ApiRole {
    match role {
        ledger::WalletRole::Affected => ApiRole::Affected,
        ledger::WalletRole::Source => ApiRole::Source,
        ledger::WalletRole::Destination => ApiRole::Destination,
    }
}

fn parse_kinds(raw: &str) -> Result<Vec<ledger::TransactionKind>, ServerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            ledger::TransactionKind::try_from(part)
                .map_err(|_| ServerError::Generic(format!("unknown transaction kind: {part}")))
        })
        .collect()
}

pub(crate) fn tx_view(
    tx: ledger::Transaction,
    currency: ledger::Currency,
    utc: FixedOffset,
) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: kind_out(tx.kind),
        title: tx.title,
        amount_units: tx.amount.units(),
        amount_display: format_amount(tx.amount, currency),
        occurred_at: tx.occurred_at.map(|at| at.with_timezone(&utc)),
        created_at: tx.created_at.with_timezone(&utc),
        tags: tx.tags,
        wallet_refs: tx
            .refs
            .into_iter()
            .map(|r| WalletRefView {
                wallet_id: r.wallet_id,
                role: role_out(r.role),
            })
            .collect(),
    }
}

pub async fn income_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<IncomeNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let amount = payload.amount.parse::<Money>()?;

    let id = state
        .ledger
        .income(ledger::IncomeCmd {
            owner_id: user.username.clone(),
            title: payload.title,
            amount,
            wallet_ids: payload.wallet_ids,
            tags: payload.tags.unwrap_or_default(),
            occurred_at: payload.occurred_at.map(|at| at.with_timezone(&Utc)),
            idempotency_key: payload.idempotency_key,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn expense_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let amount = payload.amount.parse::<Money>()?;

    let id = state
        .ledger
        .expense(ledger::ExpenseCmd {
            owner_id: user.username.clone(),
            title: payload.title,
            amount,
            wallet_ids: payload.wallet_ids,
            tags: payload.tags.unwrap_or_default(),
            occurred_at: payload.occurred_at.map(|at| at.with_timezone(&Utc)),
            idempotency_key: payload.idempotency_key,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn transfer_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let amount = payload.amount.parse::<Money>()?;

    let id = state
        .ledger
        .transfer(ledger::TransferCmd {
            owner_id: user.username.clone(),
            title: payload.title,
            amount,
            source_wallet_id: payload.source_wallet_id,
            destination_wallet_id: payload.destination_wallet_id,
            occurred_at: payload.occurred_at.map(|at| at.with_timezone(&Utc)),
            idempotency_key: payload.idempotency_key,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let kinds = query.kinds.as_deref().map(parse_kinds).transpose()?;
    let filter = ledger::TransactionListFilter {
        from: query.from.map(|at| at.with_timezone(&Utc)),
        to: query.to.map(|at| at.with_timezone(&Utc)),
        kinds,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let (transactions, next_cursor) = state
        .ledger
        .list_transactions(&user.username, &filter, limit, query.cursor.as_deref())
        .await?;

    let utc = utc_offset()?;
    let currency = state.ledger.currency();
    let transactions = transactions
        .into_iter()
        .map(|tx| tx_view(tx, currency, utc))
        .collect();

    Ok(Json(TransactionListResponse {
        transactions,
        next_cursor,
    }))
}

pub async fn detail(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state
        .ledger
        .transaction(&user.username, transaction_id)
        .await?;

    let utc = utc_offset()?;

    Ok(Json(tx_view(tx, state.ledger.currency(), utc)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let amount = payload
        .amount
        .as_deref()
        .map(str::parse::<Money>)
        .transpose()?;

    state
        .ledger
        .update_transaction(ledger::UpdateTransactionCmd {
            owner_id: user.username.clone(),
            transaction_id,
            amount,
            title: payload.title,
            occurred_at: payload.occurred_at.map(|at| at.with_timezone(&Utc)),
            wallet_ids: payload.wallet_ids,
            tags: payload.tags,
            source_wallet_id: payload.source_wallet_id,
            destination_wallet_id: payload.destination_wallet_id,
        })
        .await?;

    let tx = state
        .ledger
        .transaction(&user.username, transaction_id)
        .await?;
    let utc = utc_offset()?;

    Ok(Json(tx_view(tx, state.ledger.currency(), utc)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .ledger
        .delete_transaction(&user.username, transaction_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
