use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use tokio::sync::watch;

use crate::{
    AssetForm, LedgerError, Money, ResultLedger, Wallet, WalletKind, WalletsSnapshot, wallet_refs,
    wallets,
};

use super::{Ledger, normalize_required_name, with_tx};

impl Ledger {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, owner: &str, wallet_id: Uuid) -> ResultLedger<Wallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, owner, wallet_id).await?;
            Ok(Wallet::try_from(model)?)
        })
    }

    /// All wallets of an owner, physical and logical, ordered by name.
    pub async fn wallets(&self, owner: &str) -> ResultLedger<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            let models = wallets::Entity::find()
                .filter(wallets::Column::OwnerId.eq(owner.to_string()))
                .order_by_asc(wallets::Column::Name)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Wallet::try_from).collect()
        })
    }

    /// Adds a new wallet for an owner.
    ///
    /// The name must be unique among the owner's wallets (physical and
    /// logical share one namespace); comparison is exact after NFC
    /// normalization and trimming. The wallet starts at `initial_balance`.
    pub async fn create_wallet(
        &self,
        owner: &str,
        name: &str,
        kind: WalletKind,
        asset_form: AssetForm,
        initial_balance: Money,
    ) -> ResultLedger<Uuid> {
        let name = normalize_required_name(name)?;
        let wallet_id = with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, owner).await?;

            let exists = wallets::Entity::find()
                .filter(wallets::Column::OwnerId.eq(owner.to_string()))
                .filter(wallets::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(LedgerError::ExistingName(name));
            }

            let wallet = Wallet::new(
                owner.to_string(),
                name.clone(),
                kind,
                asset_form,
                initial_balance,
                self.currency(),
            );
            let wallet_id = wallet.id;
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            Ok(wallet_id)
        })?;
        self.notify_wallets(owner).await;
        Ok(wallet_id)
    }

    /// Renames an existing wallet, keeping the per-owner name unique.
    pub async fn rename_wallet(
        &self,
        owner: &str,
        wallet_id: Uuid,
        new_name: &str,
    ) -> ResultLedger<()> {
        let new_name = normalize_required_name(new_name)?;
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, owner, wallet_id).await?;

            let exists = wallets::Entity::find()
                .filter(wallets::Column::OwnerId.eq(owner.to_string()))
                .filter(wallets::Column::Name.eq(new_name.clone()))
                .filter(wallets::Column::Id.ne(wallet_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(LedgerError::ExistingName(new_name));
            }

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                name: ActiveValue::Set(new_name),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })?;
        self.notify_wallets(owner).await;
        Ok(())
    }

    /// Replaces a wallet's initial balance.
    ///
    /// The cached balance moves by the same difference in the same write, so
    /// recorded contributions stay intact and no recompute is needed.
    pub async fn set_initial_balance(
        &self,
        owner: &str,
        wallet_id: Uuid,
        initial_balance: Money,
    ) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, owner, wallet_id).await?;

            let overflow = || LedgerError::InvalidAmount("balance overflow".to_string());
            let delta = initial_balance
                .checked_sub(Money::from_units(model.initial_balance))
                .ok_or_else(overflow)?;
            let balance = Money::from_units(model.balance)
                .checked_add(delta)
                .ok_or_else(overflow)?;

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                initial_balance: ActiveValue::Set(initial_balance.units()),
                balance: ActiveValue::Set(balance.units()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })?;
        self.notify_wallets(owner).await;
        Ok(())
    }

    /// Deletes a wallet.
    ///
    /// Refused while any transaction still references it; history stays
    /// replayable for every wallet that ever took part in one.
    pub async fn delete_wallet(&self, owner: &str, wallet_id: Uuid) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, owner, wallet_id).await?;

            let referenced = wallet_refs::Entity::find()
                .filter(wallet_refs::Column::WalletId.eq(wallet_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if referenced {
                return Err(LedgerError::InvalidWallet(
                    "wallet is still referenced by transactions".to_string(),
                ));
            }

            wallets::Entity::delete_by_id(wallet_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;
        self.notify_wallets(owner).await;
        Ok(())
    }

    /// Subscribes to live wallet snapshots for an owner.
    ///
    /// The receiver starts on the current state; every successful mutation
    /// afterwards replaces the snapshot wholesale.
    pub async fn subscribe_wallets(
        &self,
        owner: &str,
    ) -> ResultLedger<watch::Receiver<WalletsSnapshot>> {
        let wallets = self.wallets(owner).await?;
        Ok(self.feeds.subscribe(owner, WalletsSnapshot::new(wallets)))
    }
}
