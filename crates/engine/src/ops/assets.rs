//! Asset registry: creation, lookup and safe retirement of currencies.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    AccountKind, Asset, LedgerEntry, LedgerError, Leg, ResultLedger, TREASURY_ACCOUNT_NAME,
    TransactionKind, amount, assets, entries,
};

use super::{Ledger, with_tx};

impl Ledger {
    /// Create a currency in a community.
    ///
    /// Provisions the treasury account on the way and, when `initial_supply`
    /// is positive, posts the genesis transaction crediting it. Asset row,
    /// treasury account and genesis issuance land in one commit; any failure
    /// rolls back the asset creation too.
    pub async fn create_asset(
        &self,
        community_id: &str,
        symbol: &str,
        name: &str,
        decimals: u32,
        initial_supply: Decimal,
    ) -> ResultLedger<Asset> {
        assets::validate_symbol(symbol)?;
        assets::validate_decimals(decimals)?;
        if initial_supply < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "initial supply must be >= 0, got {initial_supply}"
            )));
        }
        amount::ensure_scale(initial_supply, decimals)?;

        with_tx!(self, |db_tx| {
            let existing = Self::find_asset_by_symbol_in(&db_tx, community_id, symbol).await?;
            if existing.is_some() {
                return Err(LedgerError::DuplicateSymbol(symbol.to_string()));
            }

            let asset = Asset::new(
                community_id.to_string(),
                symbol.to_string(),
                name.to_string(),
                decimals,
            )?;
            assets::ActiveModel::from(&asset).insert(&db_tx).await?;

            let treasury = Self::ensure_system_account_in(
                &db_tx,
                community_id,
                TREASURY_ACCOUNT_NAME,
                AccountKind::Treasury,
            )
            .await?;

            if initial_supply > Decimal::ZERO {
                Self::post_in(
                    &db_tx,
                    community_id,
                    TransactionKind::Genesis,
                    &format!("genesis: {symbol}"),
                    &[Leg::new(treasury.id, asset.id, initial_supply)],
                )
                .await?;
            }

            info!(community_id, symbol, %initial_supply, "asset created");
            Ok(asset)
        })
    }

    /// Look an asset up by its community-scoped symbol.
    pub async fn asset_by_symbol(&self, community_id: &str, symbol: &str) -> ResultLedger<Asset> {
        Self::find_asset_by_symbol_in(self.database(), community_id, symbol)
            .await?
            .ok_or_else(|| LedgerError::AssetNotFound(symbol.to_string()))
    }

    /// All assets of a community, ordered by symbol ascending.
    pub async fn list_assets(&self, community_id: &str) -> ResultLedger<Vec<Asset>> {
        let models = assets::Entity::find()
            .filter(assets::Column::CommunityId.eq(community_id))
            .order_by_asc(assets::Column::Symbol)
            .all(self.database())
            .await?;
        models.into_iter().map(Asset::try_from).collect()
    }

    /// Retire a currency.
    ///
    /// Succeeds only when the sum of every entry referencing the asset is
    /// exactly zero; the recomputation shares the transaction that deletes
    /// the rows, so a concurrent transfer cannot slip between check and
    /// delete.
    pub async fn delete_asset(&self, community_id: &str, symbol: &str) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let asset = Self::find_asset_by_symbol_in(&db_tx, community_id, symbol)
                .await?
                .ok_or_else(|| LedgerError::AssetNotFound(symbol.to_string()))?;

            let entry_models = entries::Entity::find()
                .filter(entries::Column::AssetId.eq(asset.id.to_string()))
                .all(&db_tx)
                .await?;

            let mut total = Decimal::ZERO;
            for model in &entry_models {
                let entry = LedgerEntry::try_from(model.clone())?;
                total += entry.amount;
            }
            if !total.is_zero() {
                return Err(LedgerError::AssetInUse(format!(
                    "asset \"{symbol}\" has outstanding total {total}"
                )));
            }

            for model in entry_models {
                model.delete(&db_tx).await?;
            }
            assets::Entity::delete_by_id(asset.id.to_string())
                .exec(&db_tx)
                .await?;

            info!(community_id, symbol, "asset deleted");
            Ok(())
        })
    }

    /// Load an asset by id, scoped to a community.
    pub(crate) async fn require_asset_in<C: ConnectionTrait>(
        conn: &C,
        community_id: &str,
        asset_id: Uuid,
    ) -> ResultLedger<Asset> {
        let model = assets::Entity::find_by_id(asset_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| LedgerError::AssetNotFound(asset_id.to_string()))?;
        let asset = Asset::try_from(model)?;
        if asset.community_id != community_id {
            return Err(LedgerError::AssetNotFound(asset_id.to_string()));
        }
        Ok(asset)
    }

    async fn find_asset_by_symbol_in<C: ConnectionTrait>(
        conn: &C,
        community_id: &str,
        symbol: &str,
    ) -> ResultLedger<Option<Asset>> {
        let model = assets::Entity::find()
            .filter(assets::Column::CommunityId.eq(community_id))
            .filter(assets::Column::Symbol.eq(symbol))
            .one(conn)
            .await?;
        model.map(Asset::try_from).transpose()
    }
}
