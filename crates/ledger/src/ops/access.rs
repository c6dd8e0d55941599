use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, transactions, users, wallets};

use super::Ledger;

/// Generates an owner-scoped `require_*` lookup for a target entity.
///
/// Missing rows and rows belonging to another owner fold into the same
/// not-found error, so foreign ids are indistinguishable from absent ones.
macro_rules! impl_require_owned {
    ($require_fn:ident, $entity:path, $owner_col:expr, $model:ty, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            owner: &str,
            target_id: Uuid,
        ) -> ResultLedger<$model> {
            <$entity>::find_by_id(target_id.to_string())
                .filter($owner_col.eq(owner.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| LedgerError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Ledger {
    impl_require_owned!(
        require_wallet,
        wallets::Entity,
        wallets::Column::OwnerId,
        wallets::Model,
        "wallet not exists"
    );

    impl_require_owned!(
        require_transaction,
        transactions::Entity,
        transactions::Column::OwnerId,
        transactions::Model,
        "transaction not exists"
    );

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultLedger<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(LedgerError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }
}
