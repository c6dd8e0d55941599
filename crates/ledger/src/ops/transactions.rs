use std::collections::HashMap;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    DayGroup, ExpenseCmd, IncomeCmd, LedgerError, Money, OverviewFilter, ResultLedger,
    Transaction, TransactionKind, TransferCmd, UpdateTransactionCmd, WalletKind, WalletRef,
    WalletRole, contribution, day_groups, normalize_tags, tags, transactions, wallet_refs,
    wallets,
};

use super::{Ledger, normalize_required_title, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC,
/// applied to the effective date: `occurred_at` when set, `created_at`
/// otherwise.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultLedger<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(LedgerError::InvalidTransaction(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(LedgerError::InvalidTransaction(
            "kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// `effective date >= instant`, falling back to `created_at` for rows that
/// never got an explicit `occurred_at`.
fn effective_on_or_after(instant: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(transactions::Column::OccurredAt.gte(instant))
        .add(
            Condition::all()
                .add(transactions::Column::OccurredAt.is_null())
                .add(transactions::Column::CreatedAt.gte(instant)),
        )
}

fn effective_before(instant: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(transactions::Column::OccurredAt.lt(instant))
        .add(
            Condition::all()
                .add(transactions::Column::OccurredAt.is_null())
                .add(transactions::Column::CreatedAt.lt(instant)),
        )
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(effective_on_or_after(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(effective_before(to));
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }

        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    created_at: DateTime<Utc>,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultLedger<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| LedgerError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultLedger<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| LedgerError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| LedgerError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

fn transfer_endpoints(refs: &[WalletRef]) -> ResultLedger<(Uuid, Uuid)> {
    let mut source: Option<Uuid> = None;
    let mut destination: Option<Uuid> = None;
    for wallet_ref in refs {
        match wallet_ref.role {
            WalletRole::Source => source = Some(wallet_ref.wallet_id),
            WalletRole::Destination => destination = Some(wallet_ref.wallet_id),
            WalletRole::Affected => {}
        }
    }

    let source = source.ok_or_else(|| {
        LedgerError::InvalidTransfer("invalid transfer: missing source reference".to_string())
    })?;
    let destination = destination.ok_or_else(|| {
        LedgerError::InvalidTransfer("invalid transfer: missing destination reference".to_string())
    })?;
    Ok((source, destination))
}

/// Accumulates one reference's signed contribution into a per-wallet delta
/// map; pass the negated amount to back a contribution out.
///
/// Pairings current writes never produce count zero with a warning, the same
/// way replay treats them, so legacy rows stay editable.
fn fold_contribution(
    deltas: &mut HashMap<Uuid, Money>,
    kind: TransactionKind,
    wallet_ref: &WalletRef,
    amount: Money,
) -> ResultLedger<()> {
    let Some(change) = contribution(kind, wallet_ref.role, amount) else {
        tracing::warn!(
            "transaction {} pairs kind '{}' with role '{}', counting zero",
            wallet_ref.transaction_id,
            kind.as_str(),
            wallet_ref.role.as_str()
        );
        return Ok(());
    };
    let entry = deltas.entry(wallet_ref.wallet_id).or_insert(Money::ZERO);
    *entry = entry
        .checked_add(change)
        .ok_or_else(|| LedgerError::InvalidAmount("balance overflow".to_string()))?;
    Ok(())
}

impl Ledger {
    /// Records an income: `amount` is credited to every referenced wallet.
    pub async fn income(&self, cmd: IncomeCmd) -> ResultLedger<Uuid> {
        let IncomeCmd {
            owner_id,
            title,
            amount,
            wallet_ids,
            tags,
            occurred_at,
            idempotency_key,
        } = cmd;
        let id = with_tx!(self, |db_tx| {
            self.create_tagged_transaction(
                &db_tx,
                TransactionKind::Income,
                &owner_id,
                &title,
                amount,
                &wallet_ids,
                &tags,
                occurred_at,
                idempotency_key,
            )
            .await
        })?;
        self.notify_wallets(&owner_id).await;
        Ok(id)
    }

    /// Records an expense: `amount` is debited from every referenced wallet.
    pub async fn expense(&self, cmd: ExpenseCmd) -> ResultLedger<Uuid> {
        let ExpenseCmd {
            owner_id,
            title,
            amount,
            wallet_ids,
            tags,
            occurred_at,
            idempotency_key,
        } = cmd;
        let id = with_tx!(self, |db_tx| {
            self.create_tagged_transaction(
                &db_tx,
                TransactionKind::Expense,
                &owner_id,
                &title,
                amount,
                &wallet_ids,
                &tags,
                occurred_at,
                idempotency_key,
            )
            .await
        })?;
        self.notify_wallets(&owner_id).await;
        Ok(id)
    }

    /// Moves `amount` between two wallets of the same owner.
    ///
    /// Transfers across wallet kinds, or touching a wallet stored in another
    /// currency, are recorded with a warning rather than rejected.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultLedger<Uuid> {
        if cmd.source_wallet_id == cmd.destination_wallet_id {
            return Err(LedgerError::InvalidTransfer(
                "source and destination wallets must differ".to_string(),
            ));
        }
        let TransferCmd {
            owner_id,
            title,
            amount,
            source_wallet_id,
            destination_wallet_id,
            occurred_at,
            idempotency_key,
        } = cmd;
        let id = with_tx!(self, |db_tx| {
            let title = normalize_required_title(&title)?;
            self.require_user_exists(&db_tx, &owner_id).await?;
            let source = self
                .require_wallet(&db_tx, &owner_id, source_wallet_id)
                .await?;
            let destination = self
                .require_wallet(&db_tx, &owner_id, destination_wallet_id)
                .await?;
            self.warn_on_transfer_mismatch(&source, &destination);

            let tx = Transaction::new(
                owner_id.clone(),
                TransactionKind::Transfer,
                title,
                amount,
                occurred_at,
                idempotency_key,
            )?;
            let refs = vec![
                WalletRef::new(tx.id, source_wallet_id, WalletRole::Source),
                WalletRef::new(tx.id, destination_wallet_id, WalletRole::Destination),
            ];
            // Transfers move money around, they are not spending: no tags.
            self.create_transaction_with_refs(&db_tx, &tx, &refs, &[])
                .await
        })?;
        self.notify_wallets(&owner_id).await;
        Ok(id)
    }

    async fn create_tagged_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        kind: TransactionKind,
        owner_id: &str,
        title: &str,
        amount: Money,
        wallet_ids: &[Uuid],
        tags: &[String],
        occurred_at: Option<DateTime<Utc>>,
        idempotency_key: Option<String>,
    ) -> ResultLedger<Uuid> {
        let title = normalize_required_title(title)?;
        self.require_user_exists(db_tx, owner_id).await?;
        self.validate_affected_wallets(db_tx, owner_id, wallet_ids)
            .await?;

        let tx = Transaction::new(
            owner_id.to_string(),
            kind,
            title,
            amount,
            occurred_at,
            idempotency_key,
        )?;
        let refs: Vec<WalletRef> = wallet_ids
            .iter()
            .map(|wallet_id| WalletRef::new(tx.id, *wallet_id, WalletRole::Affected))
            .collect();
        let tags = normalize_tags(tags);

        self.create_transaction_with_refs(db_tx, &tx, &refs, &tags)
            .await
    }

    /// Checks the affected-wallet set of an income or expense: every listed
    /// id must exist for this owner, appear once, and the set spans at most
    /// one physical and one logical wallet. An empty set is legal; the entry
    /// is recorded without touching any balance.
    async fn validate_affected_wallets(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        wallet_ids: &[Uuid],
    ) -> ResultLedger<()> {
        let mut physical = 0;
        let mut logical = 0;
        for (position, wallet_id) in wallet_ids.iter().enumerate() {
            if wallet_ids[..position].contains(wallet_id) {
                return Err(LedgerError::InvalidTransaction(
                    "duplicate wallet reference".to_string(),
                ));
            }
            let model = self.require_wallet(db_tx, owner_id, *wallet_id).await?;
            match WalletKind::try_from(model.kind.as_str())? {
                WalletKind::Physical => physical += 1,
                WalletKind::Logical => logical += 1,
            }
        }
        if physical > 1 {
            return Err(LedgerError::InvalidTransaction(
                "at most one physical wallet per transaction".to_string(),
            ));
        }
        if logical > 1 {
            return Err(LedgerError::InvalidTransaction(
                "at most one logical wallet per transaction".to_string(),
            ));
        }
        Ok(())
    }

    fn warn_on_transfer_mismatch(&self, source: &wallets::Model, destination: &wallets::Model) {
        if source.kind != destination.kind {
            tracing::warn!(
                "transfer between {} wallet '{}' and {} wallet '{}'",
                source.kind,
                source.name,
                destination.kind,
                destination.name
            );
        }
        let configured = self.currency().code();
        for wallet in [source, destination] {
            if wallet.currency != configured {
                tracing::warn!(
                    "wallet '{}' is stored as {}, amounts are treated as {}",
                    wallet.name,
                    wallet.currency,
                    configured
                );
            }
        }
    }

    async fn find_by_idempotency_key(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultLedger<Option<Uuid>> {
        let Some(key) = tx.idempotency_key.as_deref() else {
            return Ok(None);
        };
        let existing = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(tx.owner_id.clone()))
            .filter(transactions::Column::IdempotencyKey.eq(key.to_string()))
            .one(db_tx)
            .await?;
        match existing {
            Some(model) => {
                let id = Uuid::parse_str(&model.id)
                    .map_err(|_| LedgerError::InvalidId("invalid transaction id".to_string()))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    pub(super) async fn create_transaction_with_refs(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
        refs: &[WalletRef],
        tag_rows: &[String],
    ) -> ResultLedger<Uuid> {
        for wallet_ref in refs {
            if wallet_ref.transaction_id != tx.id {
                return Err(LedgerError::InvalidTransaction(
                    "invalid wallet reference: transaction id mismatch".to_string(),
                ));
            }
        }

        if let Some(existing) = self.find_by_idempotency_key(db_tx, tx).await? {
            return Ok(existing);
        }

        let mut new_balances: HashMap<Uuid, Money> = HashMap::new();
        for wallet_ref in refs {
            let Some(delta) = contribution(tx.kind, wallet_ref.role, tx.amount) else {
                return Err(LedgerError::InvalidTransaction(
                    "incoherent wallet role for this transaction kind".to_string(),
                ));
            };
            self.apply_wallet_delta(db_tx, &tx.owner_id, &mut new_balances, wallet_ref.wallet_id, delta)
                .await?;
        }

        if let Err(err) = transactions::ActiveModel::from(tx).insert(db_tx).await {
            // A concurrent writer can win the idempotency race between the
            // pre-check and this insert; the unique index rejects us and the
            // earlier transaction id is the answer.
            if tx.idempotency_key.is_some()
                && let Some(existing) = self.find_by_idempotency_key(db_tx, tx).await?
            {
                return Ok(existing);
            }
            return Err(err.into());
        }
        for wallet_ref in refs {
            wallet_refs::ActiveModel::from(wallet_ref).insert(db_tx).await?;
        }
        for tag in tag_rows {
            let tag_row = tags::ActiveModel {
                transaction_id: ActiveValue::Set(tx.id.to_string()),
                tag: ActiveValue::Set(tag.clone()),
            };
            tag_row.insert(db_tx).await?;
        }

        self.persist_wallet_balances(db_tx, new_balances).await?;

        Ok(tx.id)
    }

    async fn apply_wallet_delta(
        &self,
        db_tx: &DatabaseTransaction,
        owner_id: &str,
        new_balances: &mut HashMap<Uuid, Money>,
        wallet_id: Uuid,
        delta: Money,
    ) -> ResultLedger<()> {
        let model = self.require_wallet(db_tx, owner_id, wallet_id).await?;
        let entry = new_balances
            .entry(wallet_id)
            .or_insert(Money::from_units(model.balance));
        *entry = entry
            .checked_add(delta)
            .ok_or_else(|| LedgerError::InvalidAmount("balance overflow".to_string()))?;
        Ok(())
    }

    async fn persist_wallet_balances(
        &self,
        db_tx: &DatabaseTransaction,
        new_balances: HashMap<Uuid, Money>,
    ) -> ResultLedger<()> {
        for (wallet_id, balance) in new_balances {
            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                balance: ActiveValue::Set(balance.units()),
                ..Default::default()
            };
            active.update(db_tx).await?;
        }
        Ok(())
    }

    /// Edits an existing transaction in place.
    ///
    /// The kind is immutable. Wallet balances move by exactly the difference
    /// between the new and old contributions, so the result is the same as if
    /// the corrected transaction had been entered in the first place.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultLedger<()> {
        let UpdateTransactionCmd {
            owner_id,
            transaction_id,
            amount,
            title,
            occurred_at,
            wallet_ids,
            tags: new_tags,
            source_wallet_id,
            destination_wallet_id,
        } = cmd;
        with_tx!(self, |db_tx| {
            let tx_model = self
                .require_transaction(&db_tx, &owner_id, transaction_id)
                .await?;
            let kind = TransactionKind::try_from(tx_model.kind.as_str())?;

            let old_amount = Money::from_units(tx_model.amount);
            let new_amount = amount.unwrap_or(old_amount);
            if !new_amount.is_positive() {
                return Err(LedgerError::InvalidAmount("amount must be > 0".to_string()));
            }
            let new_title = match title.as_deref() {
                Some(value) => normalize_required_title(value)?,
                None => tx_model.title.clone(),
            };
            // An explicit date is never cleared by an edit, only replaced.
            let new_occurred_at = occurred_at.or(tx_model.occurred_at);

            let ref_models = wallet_refs::Entity::find()
                .filter(wallet_refs::Column::TransactionId.eq(transaction_id.to_string()))
                .all(&db_tx)
                .await?;
            let mut old_refs: Vec<WalletRef> = Vec::with_capacity(ref_models.len());
            for model in ref_models {
                old_refs.push(WalletRef::try_from(model)?);
            }

            let new_refs = match kind {
                TransactionKind::Income | TransactionKind::Expense => {
                    if source_wallet_id.is_some() || destination_wallet_id.is_some() {
                        return Err(LedgerError::InvalidTransaction(
                            "invalid update: unexpected transfer fields".to_string(),
                        ));
                    }
                    match &wallet_ids {
                        Some(ids) => {
                            self.validate_affected_wallets(&db_tx, &owner_id, ids).await?;
                            ids.iter()
                                .map(|id| {
                                    WalletRef::new(transaction_id, *id, WalletRole::Affected)
                                })
                                .collect()
                        }
                        None => old_refs.clone(),
                    }
                }
                TransactionKind::Transfer => {
                    if wallet_ids.is_some() || new_tags.is_some() {
                        return Err(LedgerError::InvalidTransaction(
                            "invalid update: unexpected income or expense fields".to_string(),
                        ));
                    }
                    let (old_source, old_destination) = transfer_endpoints(&old_refs)?;
                    let new_source = source_wallet_id.unwrap_or(old_source);
                    let new_destination = destination_wallet_id.unwrap_or(old_destination);
                    if new_source == new_destination {
                        return Err(LedgerError::InvalidTransfer(
                            "source and destination wallets must differ".to_string(),
                        ));
                    }
                    let source = self.require_wallet(&db_tx, &owner_id, new_source).await?;
                    let destination = self
                        .require_wallet(&db_tx, &owner_id, new_destination)
                        .await?;
                    self.warn_on_transfer_mismatch(&source, &destination);
                    if new_source == old_source && new_destination == old_destination {
                        old_refs.clone()
                    } else {
                        vec![
                            WalletRef::new(transaction_id, new_source, WalletRole::Source),
                            WalletRef::new(transaction_id, new_destination, WalletRole::Destination),
                        ]
                    }
                }
            };
            // Kept references are clones of the old rows; rebuilt ones carry
            // fresh ids, so plain equality detects a retarget.
            let retargeted = new_refs != old_refs;

            let mut deltas: HashMap<Uuid, Money> = HashMap::new();
            for wallet_ref in &old_refs {
                fold_contribution(&mut deltas, kind, wallet_ref, -old_amount)?;
            }
            for wallet_ref in &new_refs {
                fold_contribution(&mut deltas, kind, wallet_ref, new_amount)?;
            }
            let mut new_balances: HashMap<Uuid, Money> = HashMap::new();
            for (wallet_id, delta) in deltas {
                self.apply_wallet_delta(&db_tx, &owner_id, &mut new_balances, wallet_id, delta)
                    .await?;
            }

            let active = transactions::ActiveModel {
                id: ActiveValue::Set(transaction_id.to_string()),
                title: ActiveValue::Set(new_title),
                amount: ActiveValue::Set(new_amount.units()),
                occurred_at: ActiveValue::Set(new_occurred_at),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            if retargeted {
                wallet_refs::Entity::delete_many()
                    .filter(wallet_refs::Column::TransactionId.eq(transaction_id.to_string()))
                    .exec(&db_tx)
                    .await?;
                for wallet_ref in &new_refs {
                    wallet_refs::ActiveModel::from(wallet_ref).insert(&db_tx).await?;
                }
            }

            if let Some(raw_tags) = new_tags {
                let normalized = normalize_tags(&raw_tags);
                tags::Entity::delete_many()
                    .filter(tags::Column::TransactionId.eq(transaction_id.to_string()))
                    .exec(&db_tx)
                    .await?;
                for tag in normalized {
                    let tag_row = tags::ActiveModel {
                        transaction_id: ActiveValue::Set(transaction_id.to_string()),
                        tag: ActiveValue::Set(tag),
                    };
                    tag_row.insert(&db_tx).await?;
                }
            }

            self.persist_wallet_balances(&db_tx, new_balances).await?;
            Ok(())
        })?;
        self.notify_wallets(&owner_id).await;
        Ok(())
    }

    /// Deletes a transaction and backs its contributions out of every wallet
    /// it touched.
    pub async fn delete_transaction(&self, owner: &str, transaction_id: Uuid) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let tx_model = self
                .require_transaction(&db_tx, owner, transaction_id)
                .await?;
            let kind = TransactionKind::try_from(tx_model.kind.as_str())?;
            let amount = Money::from_units(tx_model.amount);

            let ref_models = wallet_refs::Entity::find()
                .filter(wallet_refs::Column::TransactionId.eq(transaction_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut deltas: HashMap<Uuid, Money> = HashMap::new();
            for model in ref_models {
                let wallet_ref = WalletRef::try_from(model)?;
                fold_contribution(&mut deltas, kind, &wallet_ref, -amount)?;
            }
            let mut new_balances: HashMap<Uuid, Money> = HashMap::new();
            for (wallet_id, delta) in deltas {
                self.apply_wallet_delta(&db_tx, owner, &mut new_balances, wallet_id, delta)
                    .await?;
            }

            // SQLite only cascades when the foreign_keys pragma is on, so the
            // child rows go explicitly.
            tags::Entity::delete_many()
                .filter(tags::Column::TransactionId.eq(transaction_id.to_string()))
                .exec(&db_tx)
                .await?;
            wallet_refs::Entity::delete_many()
                .filter(wallet_refs::Column::TransactionId.eq(transaction_id.to_string()))
                .exec(&db_tx)
                .await?;
            transactions::Entity::delete_by_id(transaction_id.to_string())
                .exec(&db_tx)
                .await?;

            self.persist_wallet_balances(&db_tx, new_balances).await?;
            Ok(())
        })?;
        self.notify_wallets(owner).await;
        Ok(())
    }

    /// Loads one transaction with its wallet references and tags.
    pub async fn transaction(
        &self,
        owner: &str,
        transaction_id: Uuid,
    ) -> ResultLedger<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, owner, transaction_id)
                .await?;
            let mut tx = Transaction::try_from(model)?;

            let ref_models = wallet_refs::Entity::find()
                .filter(wallet_refs::Column::TransactionId.eq(transaction_id.to_string()))
                .all(&db_tx)
                .await?;
            tx.refs = ref_models
                .into_iter()
                .map(WalletRef::try_from)
                .collect::<ResultLedger<Vec<_>>>()?;

            let tag_models = tags::Entity::find()
                .filter(tags::Column::TransactionId.eq(transaction_id.to_string()))
                .order_by_asc(tags::Column::Tag)
                .all(&db_tx)
                .await?;
            tx.tags = tag_models.into_iter().map(|model| model.tag).collect();

            Ok(tx)
        })
    }

    /// Lists an owner's transactions with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(created_at DESC, id DESC)`; the
    /// returned cursor is opaque and only meaningful with the same filter.
    pub async fn list_transactions(
        &self,
        owner: &str,
        filter: &TransactionListFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultLedger<(Vec<Transaction>, Option<String>)> {
        with_tx!(self, |db_tx| {
            validate_list_filter(filter)?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner.to_string()))
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = TransactionsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::CreatedAt.eq(cursor.created_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }
            query = query.apply_tx_filters(filter);

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let page: Vec<transactions::Model> =
                rows.into_iter().take(limit as usize).collect();
            let out = self.hydrate_transactions(&db_tx, page).await?;

            let next_cursor = out.last().map(|tx| TransactionsCursor {
                created_at: tx.created_at,
                transaction_id: tx.id.to_string(),
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }

    /// Applies an overview filter to the owner's complete history and groups
    /// the survivors by calendar day, newest day first.
    pub async fn transactions_overview(
        &self,
        owner: &str,
        filter: &OverviewFilter,
    ) -> ResultLedger<Vec<DayGroup>> {
        with_tx!(self, |db_tx| {
            let wallet_models = wallets::Entity::find()
                .filter(wallets::Column::OwnerId.eq(owner.to_string()))
                .all(&db_tx)
                .await?;
            let mut wallet_kinds: HashMap<Uuid, WalletKind> =
                HashMap::with_capacity(wallet_models.len());
            for model in wallet_models {
                let id = Uuid::parse_str(&model.id)
                    .map_err(|_| LedgerError::InvalidId("invalid wallet id".to_string()))?;
                wallet_kinds.insert(id, WalletKind::try_from(model.kind.as_str())?);
            }

            // The overview spans the whole history, never the capped listing
            // query.
            let tx_models = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner.to_string()))
                .all(&db_tx)
                .await?;
            let hydrated = self.hydrate_transactions(&db_tx, tx_models).await?;

            let selected = hydrated
                .into_iter()
                .filter(|tx| filter.matches(tx, &wallet_kinds))
                .collect();
            Ok(day_groups(selected))
        })
    }

    /// Attaches wallet references and tags to a batch of rows in two queries.
    async fn hydrate_transactions(
        &self,
        db_tx: &DatabaseTransaction,
        models: Vec<transactions::Model>,
    ) -> ResultLedger<Vec<Transaction>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = models.iter().map(|model| model.id.clone()).collect();

        let mut refs_by_tx: HashMap<String, Vec<WalletRef>> = HashMap::new();
        let ref_models = wallet_refs::Entity::find()
            .filter(wallet_refs::Column::TransactionId.is_in(ids.clone()))
            .all(db_tx)
            .await?;
        for model in ref_models {
            let transaction_id = model.transaction_id.clone();
            refs_by_tx
                .entry(transaction_id)
                .or_default()
                .push(WalletRef::try_from(model)?);
        }

        let mut tags_by_tx: HashMap<String, Vec<String>> = HashMap::new();
        let tag_models = tags::Entity::find()
            .filter(tags::Column::TransactionId.is_in(ids))
            .order_by_asc(tags::Column::Tag)
            .all(db_tx)
            .await?;
        for model in tag_models {
            tags_by_tx
                .entry(model.transaction_id)
                .or_default()
                .push(model.tag);
        }

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let key = model.id.clone();
            let mut tx = Transaction::try_from(model)?;
            tx.refs = refs_by_tx.remove(&key).unwrap_or_default();
            tx.tags = tags_by_tx.remove(&key).unwrap_or_default();
            out.push(tx);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_survives_a_round_trip() {
        let cursor = TransactionsCursor {
            created_at: DateTime::parse_from_rfc3339("2026-03-01T12:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            transaction_id: Uuid::new_v4().to_string(),
        };

        let decoded = TransactionsCursor::decode(&cursor.encode().unwrap()).unwrap();
        assert_eq!(decoded.created_at, cursor.created_at);
        assert_eq!(decoded.transaction_id, cursor.transaction_id);
    }

    #[test]
    fn garbage_cursors_are_rejected() {
        for input in ["not base64!", "bm90IGpzb24", ""] {
            assert!(matches!(
                TransactionsCursor::decode(input),
                Err(LedgerError::InvalidCursor(_))
            ));
        }
    }
}
