//! Wallet primitives.
//!
//! A wallet is a place money sits: a physical one mirrors something real (a
//! bank account, the cash in a drawer, a broker), a logical one partitions
//! the same money by purpose (savings envelope, holiday fund). Balances are
//! denormalized: every write applies its exact delta and
//! [`recompute`](crate::Ledger::recompute_wallet) can rebuild the cache from
//! history at any time.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    Physical,
    Logical,
}

impl WalletKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Logical => "logical",
        }
    }
}

impl TryFrom<&str> for WalletKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "physical" => Ok(Self::Physical),
            "logical" => Ok(Self::Logical),
            other => Err(LedgerError::InvalidWallet(format!(
                "invalid wallet kind: {other}"
            ))),
        }
    }
}

/// What the money in a wallet is held as. Purely descriptive; no operation
/// branches on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetForm {
    Fiat,
    Crypto,
    PreciousMetal,
    Equity,
    Other,
}

impl AssetForm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fiat => "fiat",
            Self::Crypto => "crypto",
            Self::PreciousMetal => "precious_metal",
            Self::Equity => "equity",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for AssetForm {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "fiat" => Ok(Self::Fiat),
            "crypto" => Ok(Self::Crypto),
            "precious_metal" => Ok(Self::PreciousMetal),
            "equity" => Ok(Self::Equity),
            "other" => Ok(Self::Other),
            other => Err(LedgerError::InvalidWallet(format!(
                "invalid asset form: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    /// Stable identifier, generated once and persisted, so the wallet can be
    /// renamed without breaking references.
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    /// Immutable after creation.
    pub kind: WalletKind,
    pub asset_form: AssetForm,
    /// Starting amount the reference history is replayed on top of.
    pub initial_balance: Money,
    /// Cached current balance (`initial_balance` plus all contributions).
    pub balance: Money,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    #[must_use]
    pub fn new(
        owner_id: String,
        name: String,
        kind: WalletKind,
        asset_form: AssetForm,
        initial_balance: Money,
        currency: Currency,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            kind,
            asset_form,
            initial_balance,
            balance: initial_balance,
            currency,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub kind: String,
    pub asset_form: String,
    pub initial_balance: i64,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallet_refs::Entity")]
    WalletRefs,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::wallet_refs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletRefs.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(wallet: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(wallet.id.to_string()),
            owner_id: ActiveValue::Set(wallet.owner_id.clone()),
            name: ActiveValue::Set(wallet.name.clone()),
            kind: ActiveValue::Set(wallet.kind.as_str().to_string()),
            asset_form: ActiveValue::Set(wallet.asset_form.as_str().to_string()),
            initial_balance: ActiveValue::Set(wallet.initial_balance.units()),
            balance: ActiveValue::Set(wallet.balance.units()),
            currency: ActiveValue::Set(wallet.currency.code().to_string()),
            created_at: ActiveValue::Set(wallet.created_at),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::InvalidId("invalid wallet id".to_string()))?,
            owner_id: model.owner_id,
            name: model.name,
            kind: WalletKind::try_from(model.kind.as_str())?,
            asset_form: AssetForm::try_from(model.asset_form.as_str())?,
            initial_balance: Money::from_units(model.initial_balance),
            balance: Money::from_units(model.balance),
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            created_at: model.created_at,
        })
    }
}
