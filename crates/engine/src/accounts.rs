//! Account primitives.
//!
//! An account is a named ledger participant scoped to one community. User
//! accounts are owned by exactly one principal and named
//! `user:<external id>`; the `user:` prefix namespaces them away from the
//! reserved system names so a principal can never collide with the treasury
//! or burn account. Accounts are never deleted, only deactivated.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

/// Reserved name of the per-community treasury account.
pub const TREASURY_ACCOUNT_NAME: &str = "treasury";

/// Reserved name of the per-community burn account.
pub const BURN_ACCOUNT_NAME: &str = "burn";

/// Prefix applied to user account names.
pub(crate) const USER_ACCOUNT_PREFIX: &str = "user:";

/// Derive the deterministic account name for a principal.
pub(crate) fn user_account_name(external_id: &str) -> String {
    format!("{USER_ACCOUNT_PREFIX}{external_id}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    User,
    Treasury,
    Burn,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Treasury => "treasury",
            Self::Burn => "burn",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "treasury" => Ok(Self::Treasury),
            "burn" => Ok(Self::Burn),
            other => Err(LedgerError::AccountNotFound(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

/// A named ledger participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    pub community_id: String,
    /// Owning principal; `None` for system accounts.
    pub principal_id: Option<Uuid>,
    /// Unique within the community.
    pub name: String,
    pub kind: AccountKind,
    pub active: bool,
}

impl Account {
    pub fn new(
        community_id: String,
        principal_id: Option<Uuid>,
        name: String,
        kind: AccountKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            community_id,
            principal_id,
            name,
            kind,
            active: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: String,
    pub principal_id: Option<String>,
    pub name: String,
    pub kind: String,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::principals::Entity",
        from = "Column::PrincipalId",
        to = "super::principals::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Principals,
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::principals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Principals.def()
    }
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            community_id: ActiveValue::Set(account.community_id.clone()),
            principal_id: ActiveValue::Set(account.principal_id.map(|id| id.to_string())),
            name: ActiveValue::Set(account.name.clone()),
            kind: ActiveValue::Set(account.kind.as_str().to_string()),
            active: ActiveValue::Set(account.active),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let principal_id = match model.principal_id {
            Some(raw) => Some(
                Uuid::parse_str(&raw)
                    .map_err(|_| LedgerError::AccountNotFound(model.name.clone()))?,
            ),
            None => None,
        };
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::AccountNotFound(model.name.clone()))?,
            community_id: model.community_id,
            principal_id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            active: model.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_names_are_namespaced() {
        assert_eq!(user_account_name("42"), "user:42");
        // A principal literally named "treasury" still cannot shadow the
        // system account.
        assert_ne!(user_account_name("treasury"), TREASURY_ACCOUNT_NAME);
    }

    #[test]
    fn kind_round_trips() {
        for kind in [AccountKind::User, AccountKind::Treasury, AccountKind::Burn] {
            assert_eq!(AccountKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(AccountKind::try_from("vault").is_err());
    }
}
