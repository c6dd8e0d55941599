//! Overview API endpoint: transactions grouped by effective day.

use std::collections::HashSet;

use api_types::overview::{DayGroupView, OverviewQuery, OverviewResponse};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, transactions::tx_view, user, wallets::utc_offset};

fn parse_wallet_ids(raw: &str) -> Result<HashSet<Uuid>, ServerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part)
                .map_err(|_| ServerError::Generic(format!("invalid wallet id: {part}")))
        })
        .collect()
}

fn parse_tags(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<OverviewResponse>, ServerError> {
    let filter = ledger::OverviewFilter {
        from: query.from,
        to: query.to,
        physical_wallets: query
            .physical_wallets
            .as_deref()
            .map(parse_wallet_ids)
            .transpose()?
            .unwrap_or_default(),
        logical_wallets: query
            .logical_wallets
            .as_deref()
            .map(parse_wallet_ids)
            .transpose()?
            .unwrap_or_default(),
        tags: query.tags.as_deref().map(parse_tags).unwrap_or_default(),
    };

    let groups = state
        .ledger
        .transactions_overview(&user.username, &filter)
        .await?;

    let utc = utc_offset()?;
    let currency = state.ledger.currency();
    let days = groups
        .into_iter()
        .map(|group| DayGroupView {
            date: group.date,
            count: group.count(),
            transactions: group
                .transactions
                .into_iter()
                .map(|tx| tx_view(tx, currency, utc))
                .collect(),
        })
        .collect();

    Ok(Json(OverviewResponse { days }))
}
