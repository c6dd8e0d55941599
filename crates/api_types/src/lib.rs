use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned by every failing endpoint.
///
/// `retryable` is `true` only for transient storage failures; validation
/// errors never become retryable.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub retryable: bool,
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WalletKind {
        Physical,
        Logical,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AssetForm {
        Fiat,
        Crypto,
        PreciousMetal,
        Equity,
        Other,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        pub name: String,
        pub kind: WalletKind,
        pub asset_form: AssetForm,
        /// Decimal amount string, `.` or `,` separator, at most 8 decimals.
        pub initial_balance: String,
    }

    /// Patch body; absent fields keep their stored value.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletUpdate {
        pub name: Option<String>,
        /// Editing this shifts the cached balance by the same delta.
        pub initial_balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub name: String,
        pub kind: WalletKind,
        pub asset_form: AssetForm,
        /// Stored currency code; wallets keep the code they were created
        /// with even if the deployment currency changes later.
        pub currency: String,
        /// Raw 1e-8 major units.
        pub initial_balance_units: i64,
        pub balance_units: i64,
        /// Rendered with the configured currency, e.g. `12.34€`.
        pub balance_display: String,
        /// RFC3339 timestamp, including timezone offset.
        pub created_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletsResponse {
        pub wallets: Vec<WalletView>,
    }

    /// Response of the recompute endpoints.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecomputedBalance {
        pub wallet_id: Uuid,
        pub balance_units: i64,
        pub balance_display: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
        Transfer,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WalletRole {
        Affected,
        Source,
        Destination,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeNew {
        pub title: String,
        /// Decimal amount string, strictly positive.
        pub amount: String,
        /// At most one physical and one logical wallet.
        pub wallet_ids: Vec<Uuid>,
        pub tags: Option<Vec<String>>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: Option<DateTime<FixedOffset>>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub title: String,
        /// Decimal amount string, strictly positive.
        pub amount: String,
        /// At most one physical and one logical wallet.
        pub wallet_ids: Vec<Uuid>,
        pub tags: Option<Vec<String>>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: Option<DateTime<FixedOffset>>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub title: String,
        /// Decimal amount string, strictly positive.
        pub amount: String,
        pub source_wallet_id: Uuid,
        pub destination_wallet_id: Uuid,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: Option<DateTime<FixedOffset>>,
        /// Optional idempotency key for safely retrying the same create request.
        pub idempotency_key: Option<String>,
    }

    /// Patch body; absent fields keep their stored value. The kind never
    /// changes: `wallet_ids`/`tags` are valid on income and expense only,
    /// `source_wallet_id`/`destination_wallet_id` on transfers only.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub title: Option<String>,
        pub amount: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
        pub wallet_ids: Option<Vec<Uuid>>,
        pub tags: Option<Vec<String>>,
        pub source_wallet_id: Option<Uuid>,
        pub destination_wallet_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletRefView {
        pub wallet_id: Uuid,
        pub role: WalletRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub title: String,
        /// Raw 1e-8 major units, always positive; the sign is implied by the
        /// kind and each reference's role.
        pub amount_units: i64,
        pub amount_display: String,
        /// RFC3339 timestamp; absent for quick entries, which count on their
        /// creation date.
        pub occurred_at: Option<DateTime<FixedOffset>>,
        pub created_at: DateTime<FixedOffset>,
        pub tags: Vec<String>,
        pub wallet_refs: Vec<WalletRefView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        /// Effective-date lower bound (inclusive), RFC3339.
        pub from: Option<DateTime<FixedOffset>>,
        /// Effective-date upper bound (exclusive), RFC3339.
        pub to: Option<DateTime<FixedOffset>>,
        /// Comma-separated kind allow-list, e.g. `income,expense`.
        pub kinds: Option<String>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }
}

pub mod overview {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverviewQuery {
        /// Calendar-date lower bound (inclusive), `YYYY-MM-DD`.
        pub from: Option<NaiveDate>,
        /// Calendar-date upper bound (inclusive), `YYYY-MM-DD`.
        pub to: Option<NaiveDate>,
        /// Comma-separated wallet ids; matches transactions referencing any
        /// of them.
        pub physical_wallets: Option<String>,
        pub logical_wallets: Option<String>,
        /// Comma-separated tags; matches transactions tagged with any of
        /// them.
        pub tags: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DayGroupView {
        pub date: NaiveDate,
        pub count: usize,
        pub transactions: Vec<transaction::TransactionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverviewResponse {
        pub days: Vec<DayGroupView>,
    }
}
