//! Pure presentation logic over loaded transactions.
//!
//! Everything here works on in-memory values so it can be unit-tested
//! without a database: [`crate::Ledger::transactions_overview`] loads the
//! complete transaction set for an owner and runs it through these helpers.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Transaction, WalletKind};

/// Conjunctive transaction filter for the overview.
///
/// Each criterion only participates when set: bounds that are `None` and
/// empty selections are inactive, so the default filter matches everything.
/// Date bounds are inclusive calendar dates applied to the effective date
/// (`occurred_at`, falling back to `created_at`).
#[derive(Clone, Debug, Default)]
pub struct OverviewFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub physical_wallets: HashSet<Uuid>,
    pub logical_wallets: HashSet<Uuid>,
    pub tags: HashSet<String>,
}

impl OverviewFilter {
    /// Whether the transaction survives every active criterion.
    ///
    /// `wallet_kinds` maps wallet ids to their kind; a selected id whose
    /// actual kind does not match the selection it appears in is ignored.
    #[must_use]
    pub fn matches(&self, tx: &Transaction, wallet_kinds: &HashMap<Uuid, WalletKind>) -> bool {
        let date = tx.effective_at().date_naive();
        if let Some(from) = self.from
            && date < from
        {
            return false;
        }
        if let Some(to) = self.to
            && date > to
        {
            return false;
        }
        if !self.physical_wallets.is_empty()
            && !references_any(tx, &self.physical_wallets, wallet_kinds, WalletKind::Physical)
        {
            return false;
        }
        if !self.logical_wallets.is_empty()
            && !references_any(tx, &self.logical_wallets, wallet_kinds, WalletKind::Logical)
        {
            return false;
        }
        if !self.tags.is_empty() && !tx.tags.iter().any(|tag| self.tags.contains(tag)) {
            return false;
        }
        true
    }
}

fn references_any(
    tx: &Transaction,
    selected: &HashSet<Uuid>,
    wallet_kinds: &HashMap<Uuid, WalletKind>,
    kind: WalletKind,
) -> bool {
    tx.refs.iter().any(|r| {
        selected.contains(&r.wallet_id) && wallet_kinds.get(&r.wallet_id).copied() == Some(kind)
    })
}

/// One calendar day of transactions, newest first.
#[derive(Clone, Debug)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub transactions: Vec<Transaction>,
}

impl DayGroup {
    #[must_use]
    pub fn count(&self) -> usize {
        self.transactions.len()
    }
}

/// Partitions transactions into day groups, newest day first.
///
/// Within a group the order is newest effective timestamp first, ties broken
/// by `created_at` and then id so the result is deterministic.
#[must_use]
pub fn day_groups(mut transactions: Vec<Transaction>) -> Vec<DayGroup> {
    transactions.sort_by(|a, b| {
        (b.effective_at(), b.created_at, b.id).cmp(&(a.effective_at(), a.created_at, a.id))
    });

    let mut groups: Vec<DayGroup> = Vec::new();
    for tx in transactions {
        let date = tx.effective_at().date_naive();
        match groups.last_mut() {
            Some(group) if group.date == date => group.transactions.push(tx),
            _ => groups.push(DayGroup {
                date,
                transactions: vec![tx],
            }),
        }
    }
    groups
}
