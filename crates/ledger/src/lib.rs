pub use commands::{ExpenseCmd, IncomeCmd, TransferCmd, UpdateTransactionCmd};
pub use currency::{Currency, format_amount, format_with_code};
pub use error::LedgerError;
pub use feed::WalletsSnapshot;
pub use money::Money;
pub use ops::{Ledger, LedgerBuilder, TransactionListFilter};
pub use tags::{UNTAGGED, normalize_tags};
pub use transactions::{Transaction, TransactionKind};
pub use view::{DayGroup, OverviewFilter, day_groups};
pub use wallet_refs::{WalletRef, WalletRole, contribution};
pub use wallets::{AssetForm, Wallet, WalletKind};

mod commands;
mod currency;
mod error;
mod feed;
mod money;
mod ops;
mod tags;
mod transactions;
mod users;
mod view;
mod wallet_refs;
mod wallets;

type ResultLedger<T> = Result<T, LedgerError>;
