//! Transaction tags.
//!
//! Tags are free-form labels stored one row per (transaction, tag). They
//! exist for filtering and grouping only; no balance math reads them.

use sea_orm::entity::prelude::*;
use unicode_normalization::UnicodeNormalization;

/// Tag given to income and expense entries saved without any.
pub const UNTAGGED: &str = "Untagged";

/// Normalizes a user-supplied tag list into the stored set.
///
/// Each tag is NFC-normalized and trimmed, empties are dropped and
/// duplicates collapse (first occurrence wins). An entry that ends up with
/// no tags gets [`UNTAGGED`] so it stays reachable by tag filters.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for tag in tags {
        let tag: String = tag.nfc().collect();
        let tag = tag.trim();
        if tag.is_empty() || seen.iter().any(|s| s == tag) {
            continue;
        }
        seen.push(tag.to_string());
    }
    if seen.is_empty() {
        seen.push(UNTAGGED.to_string());
    }
    seen
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub transaction_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub tag: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
