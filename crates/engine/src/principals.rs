//! Principal records.
//!
//! A principal is whoever the caller already authenticated: the engine only
//! sees an opaque external identifier. Each external id gets a stable
//! internal row once, on first use, so accounts can reference principals
//! without depending on the external identifier format.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    /// Opaque identifier supplied by the hosting platform.
    pub external_id: String,
}

impl Principal {
    pub fn new(external_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "principals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub external_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Principal> for ActiveModel {
    fn from(principal: &Principal) -> Self {
        Self {
            id: ActiveValue::Set(principal.id.to_string()),
            external_id: ActiveValue::Set(principal.external_id.clone()),
        }
    }
}

impl TryFrom<Model> for Principal {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::AccountNotFound(model.external_id.clone()))?,
            external_id: model.external_id,
        })
    }
}
