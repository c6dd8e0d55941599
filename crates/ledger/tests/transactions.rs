use chrono::{TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use ledger::{
    AssetForm, Currency, ExpenseCmd, IncomeCmd, Ledger, LedgerError, Money, OverviewFilter,
    TransactionKind, TransactionListFilter, TransferCmd, UpdateTransactionCmd, WalletKind,
    WalletRole,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> (Ledger, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();
    let ledger = Ledger::builder()
        .database(db.clone())
        .currency(Currency::Eur)
        .build()
        .await
        .unwrap();
    (ledger, db)
}

async fn physical_wallet(ledger: &Ledger, owner: &str, name: &str, initial: i64) -> Uuid {
    ledger
        .create_wallet(
            owner,
            name,
            WalletKind::Physical,
            AssetForm::Fiat,
            Money::from_major(initial),
        )
        .await
        .unwrap()
}

async fn logical_wallet(ledger: &Ledger, owner: &str, name: &str, initial: i64) -> Uuid {
    ledger
        .create_wallet(
            owner,
            name,
            WalletKind::Logical,
            AssetForm::Fiat,
            Money::from_major(initial),
        )
        .await
        .unwrap()
}

async fn balance(ledger: &Ledger, owner: &str, wallet_id: Uuid) -> Money {
    ledger.wallet(owner, wallet_id).await.unwrap().balance
}

#[tokio::test]
async fn income_edit_delete_walks_the_balance_back() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;

    let income_id = ledger
        .income(IncomeCmd::new("alice", "Salary", Money::from_major(50)).wallet_id(cash))
        .await
        .unwrap();
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(150));

    ledger
        .update_transaction(
            UpdateTransactionCmd::new("alice", income_id).amount(Money::from_major(30)),
        )
        .await
        .unwrap();
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(130));

    ledger.delete_transaction("alice", income_id).await.unwrap();
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(100));

    let err = ledger.transaction("alice", income_id).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::KeyNotFound("transaction not exists".to_string())
    );
}

#[tokio::test]
async fn expense_debits_every_referenced_wallet() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;
    let groceries = logical_wallet(&ledger, "alice", "Groceries", 50).await;

    let expense_id = ledger
        .expense(
            ExpenseCmd::new("alice", "Lunch", Money::from_major(20))
                .wallet_id(cash)
                .wallet_id(groceries)
                .tag("Food"),
        )
        .await
        .unwrap();

    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(80));
    assert_eq!(
        balance(&ledger, "alice", groceries).await,
        Money::from_major(30)
    );

    let tx = ledger.transaction("alice", expense_id).await.unwrap();
    assert_eq!(tx.kind, TransactionKind::Expense);
    assert_eq!(tx.amount, Money::from_major(20));
    assert_eq!(tx.tags, vec!["Food".to_string()]);
    assert_eq!(tx.refs.len(), 2);
    assert!(tx.refs.iter().all(|r| r.role == WalletRole::Affected));
}

#[tokio::test]
async fn wallet_cardinality_is_enforced() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 0).await;
    let bank = physical_wallet(&ledger, "alice", "Bank", 0).await;

    let err = ledger
        .income(
            IncomeCmd::new("alice", "Salary", Money::from_major(10))
                .wallet_id(cash)
                .wallet_id(bank),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransaction("at most one physical wallet per transaction".to_string())
    );

    let err = ledger
        .income(
            IncomeCmd::new("alice", "Salary", Money::from_major(10))
                .wallet_id(cash)
                .wallet_id(cash),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransaction("duplicate wallet reference".to_string())
    );
}

#[tokio::test]
async fn income_without_wallets_moves_no_balance() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;

    // Historical entries may reference no wallet at all; they are kept as
    // plain records and contribute nothing.
    let id = ledger
        .income(IncomeCmd::new("alice", "Found receipt", Money::from_major(10)))
        .await
        .unwrap();

    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(100));
    let tx = ledger.transaction("alice", id).await.unwrap();
    assert!(tx.refs.is_empty());

    ledger
        .update_transaction(
            UpdateTransactionCmd::new("alice", id).wallet_ids(vec![cash]),
        )
        .await
        .unwrap();
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(110));

    ledger
        .update_transaction(UpdateTransactionCmd::new("alice", id).wallet_ids(vec![]))
        .await
        .unwrap();
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(100));
}

#[tokio::test]
async fn transfer_moves_money_between_wallets() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;
    let savings = logical_wallet(&ledger, "alice", "Savings", 200).await;

    // Cross-kind transfers are allowed; they only log a warning.
    let transfer_id = ledger
        .transfer(TransferCmd::new(
            "alice",
            "Set aside",
            Money::from_major(40),
            cash,
            savings,
        ))
        .await
        .unwrap();

    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(60));
    assert_eq!(
        balance(&ledger, "alice", savings).await,
        Money::from_major(240)
    );

    let tx = ledger.transaction("alice", transfer_id).await.unwrap();
    assert_eq!(tx.kind, TransactionKind::Transfer);
    assert!(tx.tags.is_empty());
    let source = tx.refs.iter().find(|r| r.role == WalletRole::Source).unwrap();
    let destination = tx
        .refs
        .iter()
        .find(|r| r.role == WalletRole::Destination)
        .unwrap();
    assert_eq!(source.wallet_id, cash);
    assert_eq!(destination.wallet_id, savings);

    ledger.delete_transaction("alice", transfer_id).await.unwrap();
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(100));
    assert_eq!(
        balance(&ledger, "alice", savings).await,
        Money::from_major(200)
    );
}

#[tokio::test]
async fn transfer_needs_two_distinct_wallets() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;

    let err = ledger
        .transfer(TransferCmd::new(
            "alice",
            "Loop",
            Money::from_major(10),
            cash,
            cash,
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransfer("source and destination wallets must differ".to_string())
    );
}

#[tokio::test]
async fn rejected_operations_leave_stores_unchanged() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;

    // Second wallet does not exist: the whole write must roll back.
    let err = ledger
        .income(
            IncomeCmd::new("alice", "Salary", Money::from_major(50))
                .wallet_id(cash)
                .wallet_id(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::KeyNotFound("wallet not exists".to_string()));

    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(100));
    let (txs, _) = ledger
        .list_transactions("alice", &TransactionListFilter::default(), 10, None)
        .await
        .unwrap();
    assert!(txs.is_empty());

    let err = ledger
        .income(IncomeCmd::new("alice", "Nothing", Money::ZERO).wallet_id(cash))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidAmount("amount must be > 0".to_string())
    );

    let err = ledger
        .income(IncomeCmd::new("alice", "  ", Money::from_major(1)).wallet_id(cash))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransaction("transaction title must not be empty".to_string())
    );
}

#[tokio::test]
async fn empty_tag_set_becomes_untagged() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 0).await;

    let plain = ledger
        .income(IncomeCmd::new("alice", "Salary", Money::from_major(10)).wallet_id(cash))
        .await
        .unwrap();
    let tx = ledger.transaction("alice", plain).await.unwrap();
    assert_eq!(tx.tags, vec![ledger::UNTAGGED.to_string()]);

    let messy = ledger
        .income(
            IncomeCmd::new("alice", "Gift", Money::from_major(5))
                .wallet_id(cash)
                .tags(vec![
                    "  Food ".to_string(),
                    "Food".to_string(),
                    "   ".to_string(),
                ]),
        )
        .await
        .unwrap();
    let tx = ledger.transaction("alice", messy).await.unwrap();
    assert_eq!(tx.tags, vec!["Food".to_string()]);
}

#[tokio::test]
async fn idempotency_key_returns_the_original_transaction() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;

    let cmd = IncomeCmd::new("alice", "Salary", Money::from_major(50))
        .wallet_id(cash)
        .idempotency_key("salary-2026-08");
    let first = ledger.income(cmd.clone()).await.unwrap();
    let second = ledger.income(cmd).await.unwrap();

    assert_eq!(first, second);
    // Applied exactly once.
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(150));
    let (txs, _) = ledger
        .list_transactions("alice", &TransactionListFilter::default(), 10, None)
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
}

#[tokio::test]
async fn update_rejects_fields_of_the_wrong_kind() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;
    let bank = physical_wallet(&ledger, "alice", "Bank", 0).await;

    let income_id = ledger
        .income(IncomeCmd::new("alice", "Salary", Money::from_major(50)).wallet_id(cash))
        .await
        .unwrap();
    let err = ledger
        .update_transaction(
            UpdateTransactionCmd::new("alice", income_id).source_wallet_id(bank),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransaction("invalid update: unexpected transfer fields".to_string())
    );

    let transfer_id = ledger
        .transfer(TransferCmd::new(
            "alice",
            "Move",
            Money::from_major(10),
            cash,
            bank,
        ))
        .await
        .unwrap();
    let err = ledger
        .update_transaction(
            UpdateTransactionCmd::new("alice", transfer_id).tags(vec!["Food".to_string()]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransaction(
            "invalid update: unexpected income or expense fields".to_string()
        )
    );

    // Nothing moved.
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(140));
    assert_eq!(balance(&ledger, "alice", bank).await, Money::from_major(10));
}

#[tokio::test]
async fn update_retargets_wallets_exactly() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;
    let bank = physical_wallet(&ledger, "alice", "Bank", 100).await;

    let income_id = ledger
        .income(IncomeCmd::new("alice", "Salary", Money::from_major(50)).wallet_id(cash))
        .await
        .unwrap();
    ledger
        .update_transaction(
            UpdateTransactionCmd::new("alice", income_id)
                .wallet_ids(vec![bank])
                .amount(Money::from_major(70)),
        )
        .await
        .unwrap();

    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(100));
    assert_eq!(balance(&ledger, "alice", bank).await, Money::from_major(170));

    let tx = ledger.transaction("alice", income_id).await.unwrap();
    assert_eq!(tx.refs.len(), 1);
    assert_eq!(tx.refs[0].wallet_id, bank);

    // Swap a transfer's endpoints.
    let savings = logical_wallet(&ledger, "alice", "Savings", 0).await;
    let transfer_id = ledger
        .transfer(TransferCmd::new(
            "alice",
            "Set aside",
            Money::from_major(20),
            bank,
            savings,
        ))
        .await
        .unwrap();
    assert_eq!(balance(&ledger, "alice", bank).await, Money::from_major(150));
    assert_eq!(balance(&ledger, "alice", savings).await, Money::from_major(20));

    ledger
        .update_transaction(
            UpdateTransactionCmd::new("alice", transfer_id).source_wallet_id(cash),
        )
        .await
        .unwrap();
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(80));
    assert_eq!(balance(&ledger, "alice", bank).await, Money::from_major(170));
    assert_eq!(balance(&ledger, "alice", savings).await, Money::from_major(20));
}

#[tokio::test]
async fn update_patches_title_and_date_without_touching_balances() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;

    let occurred = Utc.with_ymd_and_hms(2026, 7, 14, 12, 0, 0).unwrap();
    let income_id = ledger
        .income(
            IncomeCmd::new("alice", "Salery", Money::from_major(50))
                .wallet_id(cash)
                .occurred_at(occurred),
        )
        .await
        .unwrap();

    ledger
        .update_transaction(UpdateTransactionCmd::new("alice", income_id).title("Salary"))
        .await
        .unwrap();

    let tx = ledger.transaction("alice", income_id).await.unwrap();
    assert_eq!(tx.title, "Salary");
    // A patch without a date keeps the explicit one.
    assert_eq!(tx.occurred_at, Some(occurred));
    assert_eq!(balance(&ledger, "alice", cash).await, Money::from_major(150));
}

#[tokio::test]
async fn transactions_are_scoped_to_their_owner() {
    let (ledger, db) = ledger_with_db().await;
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["bob".into(), "password".into()],
    ))
    .await
    .unwrap();

    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;
    let income_id = ledger
        .income(IncomeCmd::new("alice", "Salary", Money::from_major(50)).wallet_id(cash))
        .await
        .unwrap();

    let err = ledger.transaction("bob", income_id).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::KeyNotFound("transaction not exists".to_string())
    );
    let err = ledger
        .update_transaction(
            UpdateTransactionCmd::new("bob", income_id).amount(Money::from_major(1)),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::KeyNotFound("transaction not exists".to_string())
    );
    let err = ledger.delete_transaction("bob", income_id).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::KeyNotFound("transaction not exists".to_string())
    );

    let (txs, _) = ledger
        .list_transactions("bob", &TransactionListFilter::default(), 10, None)
        .await
        .unwrap();
    assert!(txs.is_empty());
}

#[tokio::test]
async fn list_paginates_newest_first_with_a_cursor() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 0).await;

    let mut created = Vec::new();
    for index in 1..=5 {
        let id = ledger
            .income(
                IncomeCmd::new("alice", format!("Income {index}"), Money::from_major(index))
                    .wallet_id(cash),
            )
            .await
            .unwrap();
        created.push(id);
    }

    let filter = TransactionListFilter::default();
    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let (page, next) = ledger
            .list_transactions("alice", &filter, 2, cursor.as_deref())
            .await
            .unwrap();
        assert!(page.len() <= 2);
        seen.extend(page.into_iter().map(|tx| tx.id));
        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(seen.len(), 5);
    // Newest first, no duplicates across pages.
    let mut expected = created.clone();
    expected.reverse();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn list_filters_by_kind_and_effective_date() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;
    let bank = physical_wallet(&ledger, "alice", "Bank", 0).await;

    let backdated = Utc::now() - chrono::Duration::days(30);
    ledger
        .income(
            IncomeCmd::new("alice", "Old salary", Money::from_major(10))
                .wallet_id(cash)
                .occurred_at(backdated),
        )
        .await
        .unwrap();
    ledger
        .expense(ExpenseCmd::new("alice", "Lunch", Money::from_major(5)).wallet_id(cash))
        .await
        .unwrap();
    ledger
        .transfer(TransferCmd::new(
            "alice",
            "Move",
            Money::from_major(1),
            cash,
            bank,
        ))
        .await
        .unwrap();

    let incomes_only = TransactionListFilter {
        kinds: Some(vec![TransactionKind::Income]),
        ..Default::default()
    };
    let (txs, _) = ledger
        .list_transactions("alice", &incomes_only, 10, None)
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].kind, TransactionKind::Income);

    // The backdated income falls outside [cutoff, ..); the two fresh rows
    // fall back to their creation instant and stay in.
    let cutoff = Utc::now() - chrono::Duration::days(1);
    let recent = TransactionListFilter {
        from: Some(cutoff),
        ..Default::default()
    };
    let (txs, _) = ledger
        .list_transactions("alice", &recent, 10, None)
        .await
        .unwrap();
    assert_eq!(txs.len(), 2);

    let old = TransactionListFilter {
        to: Some(cutoff),
        ..Default::default()
    };
    let (txs, _) = ledger.list_transactions("alice", &old, 10, None).await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].title, "Old salary");
}

#[tokio::test]
async fn list_rejects_bad_filters_and_cursors() {
    let (ledger, _db) = ledger_with_db().await;

    let cutoff = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
    let inverted = TransactionListFilter {
        from: Some(cutoff),
        to: Some(cutoff),
        ..Default::default()
    };
    let err = ledger
        .list_transactions("alice", &inverted, 10, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransaction("invalid range: from must be < to".to_string())
    );

    let no_kinds = TransactionListFilter {
        kinds: Some(Vec::new()),
        ..Default::default()
    };
    let err = ledger
        .list_transactions("alice", &no_kinds, 10, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidTransaction("kinds must not be empty".to_string())
    );

    let err = ledger
        .list_transactions(
            "alice",
            &TransactionListFilter::default(),
            10,
            Some("not-a-cursor"),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidCursor("invalid transactions cursor".to_string())
    );
}

#[tokio::test]
async fn overview_groups_days_and_applies_filters() {
    let (ledger, _db) = ledger_with_db().await;
    let cash = physical_wallet(&ledger, "alice", "Cash", 100).await;
    let budget = logical_wallet(&ledger, "alice", "Budget", 50).await;

    let day_one = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
    let day_two = Utc.with_ymd_and_hms(2026, 8, 2, 10, 0, 0).unwrap();
    ledger
        .income(
            IncomeCmd::new("alice", "Salary", Money::from_major(10))
                .wallet_id(cash)
                .tag("Work")
                .occurred_at(day_one),
        )
        .await
        .unwrap();
    ledger
        .expense(
            ExpenseCmd::new("alice", "Lunch", Money::from_major(5))
                .wallet_id(cash)
                .tag("Food")
                .occurred_at(day_two),
        )
        .await
        .unwrap();
    ledger
        .expense(
            ExpenseCmd::new("alice", "Cinema", Money::from_major(3))
                .wallet_id(budget)
                .tag("Fun")
                .occurred_at(day_two),
        )
        .await
        .unwrap();

    let groups = ledger
        .transactions_overview("alice", &OverviewFilter::default())
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].date, day_two.date_naive());
    assert_eq!(groups[0].count(), 2);
    assert_eq!(groups[1].date, day_one.date_naive());
    assert_eq!(groups[1].count(), 1);

    let food_only = OverviewFilter {
        tags: std::collections::HashSet::from(["Food".to_string()]),
        ..Default::default()
    };
    let groups = ledger.transactions_overview("alice", &food_only).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count(), 1);
    assert_eq!(groups[0].transactions[0].title, "Lunch");

    let budget_only = OverviewFilter {
        logical_wallets: std::collections::HashSet::from([budget]),
        ..Default::default()
    };
    let groups = ledger
        .transactions_overview("alice", &budget_only)
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].transactions[0].title, "Cinema");
}
