//! The atomic posting protocol.
//!
//! [`Ledger::post`] is the only write path that creates transactions and
//! entries; every balance change flows through it. A posting inserts the
//! transaction row and all entry rows inside one storage transaction, so a
//! transaction is never observable without its entries.
//!
//! Invariant: for every non-genesis transaction, the legs of each referenced
//! asset sum to exactly zero. Genesis is the documented exception: exactly
//! one positive leg, representing currency entering existence.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, TransactionTrait};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    LedgerEntry, LedgerError, Leg, ResultLedger, Transaction, TransactionKind, amount, entries,
    transactions,
};

use super::{Ledger, with_tx};

impl Ledger {
    /// Post a balanced transaction.
    ///
    /// The engine enforces the zero-sum-per-asset rule, not the sign of
    /// individual legs; callers guard amount signs at their boundary.
    pub async fn post(
        &self,
        community_id: &str,
        kind: TransactionKind,
        description: &str,
        legs: &[Leg],
    ) -> ResultLedger<Uuid> {
        with_tx!(self, |db_tx| {
            for leg in legs {
                let asset = Self::require_asset_in(&db_tx, community_id, leg.asset_id).await?;
                amount::ensure_scale(leg.amount, asset.decimals)?;
                Self::require_account_in(&db_tx, community_id, leg.account_id).await?;
            }
            let id = Self::post_in(&db_tx, community_id, kind, description, legs).await?;
            Ok(id)
        })
    }

    /// Move `amount` of an asset between two accounts.
    ///
    /// The source-balance assertion runs inside the same storage transaction
    /// as the debit insert, so two concurrent transfers cannot both pass the
    /// check and drive the source below zero.
    ///
    /// Self-transfers are accepted: a no-op on balances, but still an
    /// auditable transaction.
    pub async fn transfer(
        &self,
        community_id: &str,
        from_account: Uuid,
        to_account: Uuid,
        asset_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> ResultLedger<Uuid> {
        amount::ensure_positive(amount)?;
        with_tx!(self, |db_tx| {
            let asset = Self::require_asset_in(&db_tx, community_id, asset_id).await?;
            amount::ensure_scale(amount, asset.decimals)?;
            let from = Self::require_account_in(&db_tx, community_id, from_account).await?;
            Self::require_account_in(&db_tx, community_id, to_account).await?;

            let tx = Transaction::new(
                community_id.to_string(),
                TransactionKind::Transfer,
                description.to_string(),
            );
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            let balance = Self::balance_in(&db_tx, from_account, asset_id).await?;
            if balance < amount {
                return Err(LedgerError::InsufficientBalance(format!(
                    "account \"{}\" holds {balance} {}, cannot move {amount}",
                    from.name, asset.symbol
                )));
            }

            Self::insert_legs_in(
                &db_tx,
                tx.id,
                &[
                    Leg::new(from_account, asset_id, -amount),
                    Leg::new(to_account, asset_id, amount),
                ],
            )
            .await?;

            info!(
                community_id,
                symbol = %asset.symbol,
                %amount,
                transaction_id = %tx.id,
                "transfer posted"
            );
            Ok(tx.id)
        })
    }

    /// Issue `amount` of an asset from the treasury into circulation.
    ///
    /// Same shape as [`transfer`](Self::transfer) but tagged
    /// [`TransactionKind::Issuance`] and without the balance assertion: a
    /// treasury is permitted to run temporarily negative.
    pub async fn issue(
        &self,
        community_id: &str,
        treasury_account: Uuid,
        recipient_account: Uuid,
        asset_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> ResultLedger<Uuid> {
        amount::ensure_positive(amount)?;
        with_tx!(self, |db_tx| {
            let asset = Self::require_asset_in(&db_tx, community_id, asset_id).await?;
            amount::ensure_scale(amount, asset.decimals)?;
            Self::require_account_in(&db_tx, community_id, treasury_account).await?;
            Self::require_account_in(&db_tx, community_id, recipient_account).await?;

            let id = Self::post_in(
                &db_tx,
                community_id,
                TransactionKind::Issuance,
                description,
                &[
                    Leg::new(treasury_account, asset_id, -amount),
                    Leg::new(recipient_account, asset_id, amount),
                ],
            )
            .await?;

            info!(
                community_id,
                symbol = %asset.symbol,
                %amount,
                transaction_id = %id,
                "issuance posted"
            );
            Ok(id)
        })
    }

    /// Insert one transaction row plus its entries on an open connection.
    ///
    /// Validates the structural rules only; callers resolve and validate the
    /// referenced accounts and assets.
    pub(crate) async fn post_in<C: ConnectionTrait>(
        conn: &C,
        community_id: &str,
        kind: TransactionKind,
        description: &str,
        legs: &[Leg],
    ) -> ResultLedger<Uuid> {
        Self::validate_legs(kind, legs)?;

        let tx = Transaction::new(community_id.to_string(), kind, description.to_string());
        transactions::ActiveModel::from(&tx).insert(conn).await?;
        Self::insert_legs_in(conn, tx.id, legs).await?;

        debug!(
            community_id,
            kind = kind.as_str(),
            legs = legs.len(),
            transaction_id = %tx.id,
            "transaction posted"
        );
        Ok(tx.id)
    }

    fn validate_legs(kind: TransactionKind, legs: &[Leg]) -> ResultLedger<()> {
        if legs.is_empty() {
            return Err(LedgerError::InvalidAmount(
                "transaction requires at least one leg".to_string(),
            ));
        }

        if kind == TransactionKind::Genesis {
            // The one sanctioned unbalanced shape.
            let [leg] = legs else {
                return Err(LedgerError::InvalidAmount(
                    "genesis transaction requires exactly one leg".to_string(),
                ));
            };
            amount::ensure_positive(leg.amount)?;
            return Ok(());
        }

        let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
        for leg in legs {
            *totals.entry(leg.asset_id).or_insert(Decimal::ZERO) += leg.amount;
        }
        for (asset_id, total) in totals {
            if !total.is_zero() {
                return Err(LedgerError::InvalidAmount(format!(
                    "legs for asset {asset_id} sum to {total}, expected zero"
                )));
            }
        }
        Ok(())
    }

    async fn insert_legs_in<C: ConnectionTrait>(
        conn: &C,
        transaction_id: Uuid,
        legs: &[Leg],
    ) -> ResultLedger<()> {
        for leg in legs {
            let entry = LedgerEntry::new(transaction_id, leg);
            entries::ActiveModel::from(&entry).insert(conn).await?;
        }
        Ok(())
    }
}
