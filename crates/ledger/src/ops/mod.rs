use sea_orm::DatabaseConnection;
use unicode_normalization::UnicodeNormalization;

use crate::{Currency, LedgerError, ResultLedger, feed::WalletFeeds, feed::WalletsSnapshot};

mod access;
mod balances;
mod transactions;
mod wallets;

pub use transactions::TransactionListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultLedger<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Stateless entry point for every ledger operation.
///
/// All state lives in the database; each operation runs in its own DB
/// transaction, so concurrent callers only ever observe committed writes.
#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
    currency: Currency,
    feeds: WalletFeeds,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// The currency every amount in this deployment is denominated in.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Pushes a fresh snapshot to wallet-feed subscribers of `owner`.
    ///
    /// Called after a mutation has committed. A failure here only loses a
    /// notification, never the write, so it is logged and swallowed.
    pub(super) async fn notify_wallets(&self, owner: &str) {
        if !self.feeds.has_subscribers(owner) {
            return;
        }
        match self.wallets(owner).await {
            Ok(wallets) => self.feeds.replace(owner, WalletsSnapshot::new(wallets)),
            Err(err) => {
                tracing::warn!("failed to refresh wallet snapshot for {owner}: {err}");
            }
        }
    }
}

fn normalize_required_name(value: &str) -> ResultLedger<String> {
    let normalized: String = value.nfc().collect();
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidWallet(
            "wallet name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_required_title(value: &str) -> ResultLedger<String> {
    let normalized: String = value.nfc().collect();
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidTransaction(
            "transaction title must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
    currency: Currency,
}

impl LedgerBuilder {
    /// Pass the required database
    #[must_use]
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Pass the deployment currency, parsed once from configuration.
    #[must_use]
    pub fn currency(mut self, currency: Currency) -> LedgerBuilder {
        self.currency = currency;
        self
    }

    /// Construct `Ledger`
    pub async fn build(self) -> ResultLedger<Ledger> {
        Ok(Ledger {
            database: self.database,
            currency: self.currency,
            feeds: WalletFeeds::default(),
        })
    }
}
