//! Ledger entries.
//!
//! A [`LedgerEntry`] is one signed movement of one asset into or out of one
//! account, belonging to exactly one transaction. Amounts are persisted as
//! exact decimal strings.
//!
//! In the engine, *every* change to balances happens via entries; a balance
//! is nothing but the sum of the entries for an `(account, asset)` pair.

use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, amount};

/// Posting input for [`Ledger::post`](crate::Ledger::post): one signed leg
/// against an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub account_id: Uuid,
    pub asset_id: Uuid,
    /// Signed amount: positive credits the account, negative debits it.
    pub amount: Decimal,
}

impl Leg {
    pub fn new(account_id: Uuid, asset_id: Uuid, amount: Decimal) -> Self {
        Self {
            account_id,
            asset_id,
            amount,
        }
    }
}

/// One committed signed movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub asset_id: Uuid,
    pub amount: Decimal,
}

impl LedgerEntry {
    pub fn new(transaction_id: Uuid, leg: &Leg) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            account_id: leg.account_id,
            asset_id: leg.asset_id,
            amount: leg.amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub account_id: String,
    pub asset_id: String,
    /// Exact decimal string, never a binary float.
    pub amount: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::assets::Entity",
        from = "Column::AssetId",
        to = "super::assets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Assets,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::assets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            account_id: ActiveValue::Set(entry.account_id.to_string()),
            asset_id: ActiveValue::Set(entry.asset_id.to_string()),
            amount: ActiveValue::Set(entry.amount.to_string()),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let parse = |value: &str, label: &str| {
            Uuid::parse_str(value)
                .map_err(|_| LedgerError::InvalidAmount(format!("invalid stored {label} id")))
        };
        Ok(Self {
            id: parse(&model.id, "entry")?,
            transaction_id: parse(&model.transaction_id, "transaction")?,
            account_id: parse(&model.account_id, "account")?,
            asset_id: parse(&model.asset_id, "asset")?,
            amount: amount::parse_stored_amount(&model.amount)?,
        })
    }
}
