//! Wallet references.
//!
//! A [`WalletRef`] links a transaction to one wallet with a role. The signed
//! balance change is not stored: it is derived from the transaction kind,
//! the role and the amount by [`contribution`], so the pairing rules live in
//! exactly one place.
//!
//! In the ledger, *every* change to balances happens via wallet references.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money, TransactionKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletRole {
    /// Income lands here, expense leaves from here.
    Affected,
    /// Transfer only: money leaves this wallet.
    Source,
    /// Transfer only: money arrives in this wallet.
    Destination,
}

impl WalletRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Affected => "affected",
            Self::Source => "source",
            Self::Destination => "destination",
        }
    }
}

impl TryFrom<&str> for WalletRole {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "affected" => Ok(Self::Affected),
            "source" => Ok(Self::Source),
            "destination" => Ok(Self::Destination),
            other => Err(LedgerError::InvalidTransaction(format!(
                "invalid wallet role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRef {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub wallet_id: Uuid,
    pub role: WalletRole,
}

impl WalletRef {
    #[must_use]
    pub fn new(transaction_id: Uuid, wallet_id: Uuid, role: WalletRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            wallet_id,
            role,
        }
    }
}

/// Signed amount one wallet reference adds to its wallet's balance.
///
/// `None` marks a (kind, role) pairing current writes never produce; replay
/// code treats those rows as zero-contribution and warns instead of failing,
/// so a recompute still heals databases that carry legacy rows.
#[must_use]
pub fn contribution(kind: TransactionKind, role: WalletRole, amount: Money) -> Option<Money> {
    match (kind, role) {
        (TransactionKind::Income, WalletRole::Affected) => Some(amount),
        (TransactionKind::Expense, WalletRole::Affected) => Some(-amount),
        (TransactionKind::Transfer, WalletRole::Source) => Some(-amount),
        (TransactionKind::Transfer, WalletRole::Destination) => Some(amount),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_refs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub wallet_id: String,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&WalletRef> for ActiveModel {
    fn from(wallet_ref: &WalletRef) -> Self {
        Self {
            id: ActiveValue::Set(wallet_ref.id.to_string()),
            transaction_id: ActiveValue::Set(wallet_ref.transaction_id.to_string()),
            wallet_id: ActiveValue::Set(wallet_ref.wallet_id.to_string()),
            role: ActiveValue::Set(wallet_ref.role.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for WalletRef {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::InvalidId("invalid wallet ref id".to_string()))?,
            transaction_id: Uuid::parse_str(&model.transaction_id)
                .map_err(|_| LedgerError::InvalidId("invalid transaction id".to_string()))?,
            wallet_id: Uuid::parse_str(&model.wallet_id)
                .map_err(|_| LedgerError::InvalidId("invalid wallet id".to_string()))?,
            role: WalletRole::try_from(model.role.as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contribution_signs_follow_kind_and_role() {
        let amount = Money::from_major(7);
        assert_eq!(
            contribution(TransactionKind::Income, WalletRole::Affected, amount),
            Some(amount)
        );
        assert_eq!(
            contribution(TransactionKind::Expense, WalletRole::Affected, amount),
            Some(-amount)
        );
        assert_eq!(
            contribution(TransactionKind::Transfer, WalletRole::Source, amount),
            Some(-amount)
        );
        assert_eq!(
            contribution(TransactionKind::Transfer, WalletRole::Destination, amount),
            Some(amount)
        );
    }

    #[test]
    fn incoherent_pairings_contribute_nothing() {
        let amount = Money::from_major(7);
        assert_eq!(
            contribution(TransactionKind::Income, WalletRole::Source, amount),
            None
        );
        assert_eq!(
            contribution(TransactionKind::Income, WalletRole::Destination, amount),
            None
        );
        assert_eq!(
            contribution(TransactionKind::Expense, WalletRole::Source, amount),
            None
        );
        assert_eq!(
            contribution(TransactionKind::Transfer, WalletRole::Affected, amount),
            None
        );
    }
}
