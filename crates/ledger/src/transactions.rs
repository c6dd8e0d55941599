//! Transaction primitives.
//!
//! A `Transaction` is an atomic event that changes balances via the wallet
//! references attached to it (see [`crate::wallet_refs`]). The amount is a
//! single positive magnitude; signs come from the (kind, role) pairing of
//! each reference.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money, ResultLedger};

use super::wallet_refs;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(LedgerError::InvalidTransaction(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    /// Immutable after creation; editing a mistaken kind means delete and
    /// re-enter.
    pub kind: TransactionKind,
    pub title: String,
    /// Positive magnitude; see [`crate::contribution`] for the sign.
    pub amount: Money,
    /// When the user says it happened. `None` for quick entries; the
    /// effective date then falls back to `created_at`.
    pub occurred_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub refs: Vec<wallet_refs::WalletRef>,
    pub tags: Vec<String>,
}

impl Transaction {
    pub fn new(
        owner_id: String,
        kind: TransactionKind,
        title: String,
        amount: Money,
        occurred_at: Option<DateTime<Utc>>,
        idempotency_key: Option<String>,
    ) -> ResultLedger<Self> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            kind,
            title,
            amount,
            occurred_at,
            created_at: Utc::now(),
            idempotency_key,
            refs: Vec::new(),
            tags: Vec::new(),
        })
    }

    /// The date the transaction counts on: `occurred_at` when the user set
    /// one, the insertion time otherwise.
    #[must_use]
    pub fn effective_at(&self) -> DateTime<Utc> {
        self.occurred_at.unwrap_or(self.created_at)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub kind: String,
    pub title: String,
    pub amount: i64,
    pub occurred_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallet_refs::Entity")]
    WalletRefs,
    #[sea_orm(has_many = "super::tags::Entity")]
    Tags,
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

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tags.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            owner_id: ActiveValue::Set(tx.owner_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            title: ActiveValue::Set(tx.title.clone()),
            amount: ActiveValue::Set(tx.amount.units()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            created_at: ActiveValue::Set(tx.created_at),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::InvalidId("invalid transaction id".to_string()))?,
            owner_id: model.owner_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            title: model.title,
            amount: Money::from_units(model.amount),
            occurred_at: model.occurred_at,
            created_at: model.created_at,
            idempotency_key: model.idempotency_key,
            refs: Vec::new(),
            tags: Vec::new(),
        })
    }
}
