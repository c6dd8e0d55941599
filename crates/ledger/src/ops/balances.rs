use std::collections::HashMap;

use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    LedgerError, Money, ResultLedger, TransactionKind, WalletRole, contribution, transactions,
    wallet_refs, wallets,
};

use super::{Ledger, with_tx};

/// Folds one reference row into a running balance.
///
/// Unknown (kind, role) pairings count zero and are logged; everything else
/// accumulates with checked arithmetic so a corrupt history surfaces as an
/// error instead of a silently wrapped balance.
fn apply_contribution(
    total: Money,
    ref_model: &wallet_refs::Model,
    tx_model: &transactions::Model,
) -> ResultLedger<Money> {
    let kind = TransactionKind::try_from(tx_model.kind.as_str())?;
    let role = WalletRole::try_from(ref_model.role.as_str())?;
    let amount = Money::from_units(tx_model.amount);
    match contribution(kind, role, amount) {
        Some(change) => total
            .checked_add(change)
            .ok_or_else(|| LedgerError::InvalidAmount("balance overflow".to_string())),
        None => {
            tracing::warn!(
                "transaction {} pairs kind '{}' with role '{}', counting zero",
                tx_model.id,
                tx_model.kind,
                ref_model.role
            );
            Ok(total)
        }
    }
}

impl Ledger {
    /// Recomputes one wallet's denormalized balance from its complete
    /// reference history and returns the authoritative value.
    ///
    /// The write paths keep the cache exact, so this is a repair and audit
    /// tool: running it twice in a row changes nothing.
    pub async fn recompute_wallet(&self, owner: &str, wallet_id: Uuid) -> ResultLedger<Money> {
        let balance = with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, owner, wallet_id).await?;

            // The full history, deliberately unbounded: a recompute must
            // never read through the capped listing query.
            let rows = wallet_refs::Entity::find()
                .find_also_related(transactions::Entity)
                .filter(wallet_refs::Column::WalletId.eq(wallet_id.to_string()))
                .filter(transactions::Column::OwnerId.eq(owner.to_string()))
                .all(&db_tx)
                .await?;

            let mut total = Money::from_units(model.initial_balance);
            for (ref_model, tx_model) in rows {
                let Some(tx_model) = tx_model else {
                    tracing::warn!("wallet ref {} has no transaction row", ref_model.id);
                    continue;
                };
                total = apply_contribution(total, &ref_model, &tx_model)?;
            }

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                balance: ActiveValue::Set(total.units()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(total)
        })?;
        self.notify_wallets(owner).await;
        Ok(balance)
    }

    /// Recomputes every wallet of an owner in one pass.
    ///
    /// Loads the owner's complete reference history once and buckets it by
    /// wallet, then rewrites each cached balance.
    pub async fn recompute_balances(&self, owner: &str) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let wallet_models = wallets::Entity::find()
                .filter(wallets::Column::OwnerId.eq(owner.to_string()))
                .all(&db_tx)
                .await?;

            let mut totals: HashMap<String, Money> = wallet_models
                .iter()
                .map(|model| (model.id.clone(), Money::from_units(model.initial_balance)))
                .collect();

            let rows = wallet_refs::Entity::find()
                .find_also_related(transactions::Entity)
                .filter(transactions::Column::OwnerId.eq(owner.to_string()))
                .all(&db_tx)
                .await?;

            for (ref_model, tx_model) in rows {
                let Some(tx_model) = tx_model else {
                    tracing::warn!("wallet ref {} has no transaction row", ref_model.id);
                    continue;
                };
                let Some(total) = totals.get_mut(&ref_model.wallet_id) else {
                    tracing::warn!(
                        "wallet ref {} points at unknown wallet {}",
                        ref_model.id,
                        ref_model.wallet_id
                    );
                    continue;
                };
                *total = apply_contribution(*total, &ref_model, &tx_model)?;
            }

            for (wallet_id, total) in &totals {
                let active = wallets::ActiveModel {
                    id: ActiveValue::Set(wallet_id.clone()),
                    balance: ActiveValue::Set(total.units()),
                    ..Default::default()
                };
                active.update(&db_tx).await?;
            }
            Ok(())
        })?;
        self.notify_wallets(owner).await;
        Ok(())
    }
}
