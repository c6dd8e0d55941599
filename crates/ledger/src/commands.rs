//! Command structs for ledger operations.
//!
//! These types group parameters for write operations
//! (income/expense/transfer/update), keeping call sites readable and avoiding
//! long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Money;

/// Create an income transaction.
#[derive(Clone, Debug)]
pub struct IncomeCmd {
    pub owner_id: String,
    pub title: String,
    pub amount: Money,
    /// Wallets the income lands in: at most one physical and one logical.
    pub wallet_ids: Vec<Uuid>,
    pub tags: Vec<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
}

impl IncomeCmd {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, title: impl Into<String>, amount: Money) -> Self {
        Self {
            owner_id: owner_id.into(),
            title: title.into(),
            amount,
            wallet_ids: Vec::new(),
            tags: Vec::new(),
            occurred_at: None,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_ids.push(wallet_id);
        self
    }

    #[must_use]
    pub fn wallet_ids(mut self, wallet_ids: Vec<Uuid>) -> Self {
        self.wallet_ids = wallet_ids;
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Create an expense transaction.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub owner_id: String,
    pub title: String,
    pub amount: Money,
    /// Wallets the expense leaves from: at most one physical and one logical.
    pub wallet_ids: Vec<Uuid>,
    pub tags: Vec<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, title: impl Into<String>, amount: Money) -> Self {
        Self {
            owner_id: owner_id.into(),
            title: title.into(),
            amount,
            wallet_ids: Vec::new(),
            tags: Vec::new(),
            occurred_at: None,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_ids.push(wallet_id);
        self
    }

    #[must_use]
    pub fn wallet_ids(mut self, wallet_ids: Vec<Uuid>) -> Self {
        self.wallet_ids = wallet_ids;
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Create a wallet-to-wallet transfer transaction.
///
/// Transfers carry no tags: they move money around, they are not spending.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub owner_id: String,
    pub title: String,
    pub amount: Money,
    pub source_wallet_id: Uuid,
    pub destination_wallet_id: Uuid,
    pub occurred_at: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        amount: Money,
        source_wallet_id: Uuid,
        destination_wallet_id: Uuid,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            title: title.into(),
            amount,
            source_wallet_id,
            destination_wallet_id,
            occurred_at: None,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Update an existing transaction.
///
/// Every field is optional; `None` keeps the stored value. The kind cannot
/// change, and retargeting fields must match the kind: `wallet_ids`/`tags`
/// belong to income and expense, `source_wallet_id`/`destination_wallet_id`
/// to transfers.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub owner_id: String,
    pub transaction_id: Uuid,

    pub amount: Option<Money>,
    pub title: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,

    // Income/Expense retargeting.
    pub wallet_ids: Option<Vec<Uuid>>,
    pub tags: Option<Vec<String>>,

    // Transfer retargeting.
    pub source_wallet_id: Option<Uuid>,
    pub destination_wallet_id: Option<Uuid>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(owner_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            owner_id: owner_id.into(),
            transaction_id,
            amount: None,
            title: None,
            occurred_at: None,
            wallet_ids: None,
            tags: None,
            source_wallet_id: None,
            destination_wallet_id: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn wallet_ids(mut self, wallet_ids: Vec<Uuid>) -> Self {
        self.wallet_ids = Some(wallet_ids);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    #[must_use]
    pub fn source_wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.source_wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn destination_wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.destination_wallet_id = Some(wallet_id);
        self
    }
}
