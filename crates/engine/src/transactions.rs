//! Transaction primitives.
//!
//! A `Transaction` is an atomic, immutable record of one value movement. It
//! exists if and only if its entries exist: the row and its entries land in
//! one storage commit or not at all.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

/// Fixed civil offset for transaction timestamps (UTC+9).
///
/// Any fixed offset would do; what matters is that timestamps are
/// reproducible regardless of host timezone configuration.
const LEDGER_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// Current time in the ledger's fixed civil timezone.
pub fn ledger_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(LEDGER_UTC_OFFSET_SECS)
        .unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&offset)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Currency entering existence at asset creation. The only kind allowed
    /// to carry a single unbalanced leg (a positive credit to the treasury).
    Genesis,
    /// Treasury moving existing currency into circulation.
    Issuance,
    /// Value moving between two accounts.
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Genesis => "genesis",
            Self::Issuance => "issuance",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "genesis" => Ok(Self::Genesis),
            "issuance" => Ok(Self::Issuance),
            "transfer" => Ok(Self::Transfer),
            other => Err(LedgerError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub community_id: String,
    pub kind: TransactionKind,
    pub description: String,
    pub created_at: DateTime<FixedOffset>,
}

impl Transaction {
    pub fn new(community_id: String, kind: TransactionKind, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            community_id,
            kind,
            description,
            created_at: ledger_now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: String,
    pub kind: String,
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            community_id: ActiveValue::Set(tx.community_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            description: ActiveValue::Set(tx.description.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> ResultLedger<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| {
                LedgerError::InvalidAmount("invalid stored transaction id".to_string())
            })?,
            community_id: model.community_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
