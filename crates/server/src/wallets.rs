//! Wallet API endpoints.

use api_types::wallet::{
    RecomputedBalance, WalletCreated, WalletNew, WalletUpdate, WalletView, WalletsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::FixedOffset;
use ledger::{Money, format_amount};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn kind_out(kind: ledger::WalletKind) -> api_types::wallet::WalletKind {
    match kind {
        ledger::WalletKind::Physical => api_types::wallet::WalletKind::Physical,
        ledger::WalletKind::Logical => api_types::wallet::WalletKind::Logical,
    }
}

fn kind_in(kind: api_types::wallet::WalletKind) -> ledger::WalletKind {
    match kind {
        api_types::wallet::WalletKind::Physical => ledger::WalletKind::Physical,
        api_types::wallet::WalletKind::Logical => ledger::WalletKind::Logical,
    }
}

fn asset_form_out(form: ledger::AssetForm) -> api_types::wallet::AssetForm {
    match form {
        ledger::AssetForm::Fiat => api_types::wallet::AssetForm::Fiat,
        ledger::AssetForm::Crypto => api_types::wallet::AssetForm::Crypto,
        ledger::AssetForm::PreciousMetal => api_types::wallet::AssetForm::PreciousMetal,
        ledger::AssetForm::Equity => api_types::wallet::AssetForm::Equity,
        ledger::AssetForm::Other => api_types::wallet::AssetForm::Other,
    }
}

fn asset_form_in(form: api_types::wallet::AssetForm) -> ledger::AssetForm {
    match form {
        api_types::wallet::AssetForm::Fiat => ledger::AssetForm::Fiat,
        api_types::wallet::AssetForm::Crypto => ledger::AssetForm::Crypto,
        api_types::wallet::AssetForm::PreciousMetal => ledger::AssetForm::PreciousMetal,
        api_types::wallet::AssetForm::Equity => ledger::AssetForm::Equity,
        api_types::wallet::AssetForm::Other => ledger::AssetForm::Other,
    }
}

pub(crate) fn utc_offset() -> Result<FixedOffset, ServerError> {
    FixedOffset::east_opt(0).ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))
}

fn wallet_view(wallet: ledger::Wallet, utc: FixedOffset) -> WalletView {
    WalletView {
        id: wallet.id,
        name: wallet.name,
        kind: kind_out(wallet.kind),
        asset_form: asset_form_out(wallet.asset_form),
        currency: wallet.currency.code().to_string(),
        initial_balance_units: wallet.initial_balance.units(),
        balance_units: wallet.balance.units(),
        balance_display: format_amount(wallet.balance, wallet.currency),
        created_at: wallet.created_at.with_timezone(&utc),
    }
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WalletNew>,
) -> Result<(StatusCode, Json<WalletCreated>), ServerError> {
    let initial_balance = payload.initial_balance.parse::<Money>()?;

    let id = state
        .ledger
        .create_wallet(
            &user.username,
            &payload.name,
            kind_in(payload.kind),
            asset_form_in(payload.asset_form),
            initial_balance,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(WalletCreated { id })))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<WalletsResponse>, ServerError> {
    let utc = utc_offset()?;
    let wallets = state
        .ledger
        .wallets(&user.username)
        .await?
        .into_iter()
        .map(|wallet| wallet_view(wallet, utc))
        .collect();

    Ok(Json(WalletsResponse { wallets }))
}

pub async fn detail(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<WalletView>, ServerError> {
    let utc = utc_offset()?;
    let wallet = state.ledger.wallet(&user.username, wallet_id).await?;

    Ok(Json(wallet_view(wallet, utc)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<WalletUpdate>,
) -> Result<Json<WalletView>, ServerError> {
    if payload.name.is_none() && payload.initial_balance.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name or initial_balance".to_string(),
        ));
    }

    if let Some(name) = payload.name.as_deref() {
        state
            .ledger
            .rename_wallet(&user.username, wallet_id, name)
            .await?;
    }
    if let Some(initial_balance) = payload.initial_balance.as_deref() {
        let initial_balance = initial_balance.parse::<Money>()?;
        state
            .ledger
            .set_initial_balance(&user.username, wallet_id, initial_balance)
            .await?;
    }

    let utc = utc_offset()?;
    let wallet = state.ledger.wallet(&user.username, wallet_id).await?;

    Ok(Json(wallet_view(wallet, utc)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.ledger.delete_wallet(&user.username, wallet_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn recompute_one(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<RecomputedBalance>, ServerError> {
    let balance = state
        .ledger
        .recompute_wallet(&user.username, wallet_id)
        .await?;

    Ok(Json(RecomputedBalance {
        wallet_id,
        balance_units: balance.units(),
        balance_display: format_amount(balance, state.ledger.currency()),
    }))
}

pub async fn recompute_all(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<WalletsResponse>, ServerError> {
    state.ledger.recompute_balances(&user.username).await?;

    let utc = utc_offset()?;
    let wallets = state
        .ledger
        .wallets(&user.username)
        .await?
        .into_iter()
        .map(|wallet| wallet_view(wallet, utc))
        .collect();

    Ok(Json(WalletsResponse { wallets }))
}
