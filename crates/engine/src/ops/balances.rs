//! Balance derivation.
//!
//! A balance is always computed from the entries that justify it; nothing is
//! cached between calls. Sums run application-side over the exact decimal
//! strings, so SQLite numeric affinity never touches them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    Asset, LedgerEntry, ResultLedger, TREASURY_ACCOUNT_NAME, assets, entries,
};

use super::Ledger;

impl Ledger {
    /// Current balance of an `(account, asset)` pair.
    ///
    /// Returns exact zero (not an error) when no entries exist.
    pub async fn balance_of(&self, account_id: Uuid, asset_id: Uuid) -> ResultLedger<Decimal> {
        Self::balance_in(self.database(), account_id, asset_id).await
    }

    /// Holdings of an account within a community: `(asset, balance)` pairs
    /// with strictly positive balances, ordered by symbol.
    pub async fn balances_of(
        &self,
        account_id: Uuid,
        community_id: &str,
    ) -> ResultLedger<Vec<(Asset, Decimal)>> {
        let all = self.account_balances(account_id, community_id).await?;
        Ok(all
            .into_iter()
            .filter(|(_, balance)| *balance > Decimal::ZERO)
            .collect())
    }

    /// Treasury balances of a community, ordered by symbol.
    ///
    /// Unlike [`balances_of`](Self::balances_of) this keeps zero and negative
    /// balances visible, so an overdrawn treasury stays auditable. Returns an
    /// empty list when the treasury was never provisioned.
    pub async fn treasury_balances(
        &self,
        community_id: &str,
    ) -> ResultLedger<Vec<(Asset, Decimal)>> {
        let treasury_id = match self
            .account_id_by_name(community_id, TREASURY_ACCOUNT_NAME)
            .await
        {
            Ok(id) => id,
            Err(crate::LedgerError::AccountNotFound(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        self.account_balances(treasury_id, community_id).await
    }

    /// Sum of all entry amounts for one `(account, asset)` pair.
    pub(crate) async fn balance_in<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        asset_id: Uuid,
    ) -> ResultLedger<Decimal> {
        let models = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id.to_string()))
            .filter(entries::Column::AssetId.eq(asset_id.to_string()))
            .all(conn)
            .await?;

        let mut total = Decimal::ZERO;
        for model in models {
            let entry = LedgerEntry::try_from(model)?;
            total += entry.amount;
        }
        Ok(total)
    }

    /// All `(asset, balance)` pairs of an account, ordered by symbol.
    async fn account_balances(
        &self,
        account_id: Uuid,
        community_id: &str,
    ) -> ResultLedger<Vec<(Asset, Decimal)>> {
        let rows: Vec<(entries::Model, Option<assets::Model>)> = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id.to_string()))
            .find_also_related(assets::Entity)
            .all(self.database())
            .await?;

        // Group by symbol; BTreeMap keeps the ascending symbol order.
        let mut totals: BTreeMap<String, (Asset, Decimal)> = BTreeMap::new();
        for (entry_model, asset_model) in rows {
            let Some(asset_model) = asset_model else { continue };
            if asset_model.community_id != community_id {
                continue;
            }
            let entry = LedgerEntry::try_from(entry_model)?;
            let asset = Asset::try_from(asset_model)?;
            let slot = totals
                .entry(asset.symbol.clone())
                .or_insert_with(|| (asset, Decimal::ZERO));
            slot.1 += entry.amount;
        }

        Ok(totals.into_values().collect())
    }
}
