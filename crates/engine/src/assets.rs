//! Asset primitives.
//!
//! An `Asset` is a currency scoped to one community: a short case-sensitive
//! symbol, a display name and a declared decimal precision. `(community,
//! symbol)` is unique across the whole store. Assets are immutable once
//! created; the only lifecycle operation besides creation is full deletion,
//! which the registry allows only when the asset's entries sum to zero.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

/// Maximum symbol length accepted by [`validate_symbol`].
pub(crate) const MAX_SYMBOL_LEN: usize = 16;

/// Maximum decimal precision an asset may declare.
pub(crate) const MAX_DECIMALS: u32 = 8;

/// Check the symbol charset/length rule: ASCII alphanumeric, 1–16 chars.
///
/// Symbols are case-sensitive; `gold` and `GOLD` are different assets.
pub(crate) fn validate_symbol(symbol: &str) -> ResultLedger<()> {
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return Err(LedgerError::InvalidSymbol(format!(
            "symbol must be 1-{MAX_SYMBOL_LEN} characters"
        )));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::InvalidSymbol(format!(
            "symbol \"{symbol}\" must be alphanumeric"
        )));
    }
    Ok(())
}

pub(crate) fn validate_decimals(decimals: u32) -> ResultLedger<()> {
    if decimals > MAX_DECIMALS {
        return Err(LedgerError::InvalidAmount(format!(
            "decimals must be 0-{MAX_DECIMALS}, got {decimals}"
        )));
    }
    Ok(())
}

/// A community-scoped currency definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    pub community_id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
}

impl Asset {
    pub fn new(
        community_id: String,
        symbol: String,
        name: String,
        decimals: u32,
    ) -> ResultLedger<Self> {
        validate_symbol(&symbol)?;
        validate_decimals(decimals)?;
        Ok(Self {
            id: Uuid::new_v4(),
            community_id,
            symbol,
            name,
            decimals,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub community_id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: i16,
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

impl From<&Asset> for ActiveModel {
    fn from(asset: &Asset) -> Self {
        Self {
            id: ActiveValue::Set(asset.id.to_string()),
            community_id: ActiveValue::Set(asset.community_id.clone()),
            symbol: ActiveValue::Set(asset.symbol.clone()),
            name: ActiveValue::Set(asset.name.clone()),
            decimals: ActiveValue::Set(asset.decimals as i16),
        }
    }
}

impl TryFrom<Model> for Asset {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let decimals = u32::try_from(model.decimals)
            .map_err(|_| LedgerError::InvalidAmount("invalid stored decimals".to_string()))?;
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::AssetNotFound(model.symbol.clone()))?,
            community_id: model.community_id,
            symbol: model.symbol,
            name: model.name,
            decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_rule_accepts_alphanumerics() {
        assert!(validate_symbol("GOLD").is_ok());
        assert!(validate_symbol("g0ld42").is_ok());
        assert!(validate_symbol("A").is_ok());
        assert!(validate_symbol("A234567890123456").is_ok());
    }

    #[test]
    fn symbol_rule_rejects_bad_input() {
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("A2345678901234567").is_err());
        assert!(validate_symbol("GO LD").is_err());
        assert!(validate_symbol("gold!").is_err());
        assert!(validate_symbol("日本円").is_err());
    }

    #[test]
    fn decimals_are_bounded() {
        assert!(validate_decimals(0).is_ok());
        assert!(validate_decimals(8).is_ok());
        assert!(validate_decimals(9).is_err());
    }
}
