//! Internal helpers for decimal amount validation and conversion.
//!
//! Amounts are [`rust_decimal::Decimal`] in the domain layer and exact
//! decimal strings in storage. Binary floats never appear anywhere, so
//! accumulated sums cannot drift.
//!
//! The engine does not re-round caller amounts: a value carrying more
//! fractional digits than the asset declares is rejected instead of being
//! silently quantized.

use rust_decimal::Decimal;

use crate::{LedgerError, ResultLedger};

/// Parse an amount string coming from storage.
pub(crate) fn parse_stored_amount(value: &str) -> ResultLedger<Decimal> {
    value
        .parse::<Decimal>()
        .map_err(|_| LedgerError::InvalidAmount(format!("invalid stored amount: {value}")))
}

/// Reject amounts that are not strictly positive.
pub(crate) fn ensure_positive(amount: Decimal) -> ResultLedger<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    Ok(())
}

/// Reject amounts with more fractional digits than the asset declares.
pub(crate) fn ensure_scale(amount: Decimal, decimals: u32) -> ResultLedger<()> {
    if amount.normalize().scale() > decimals {
        return Err(LedgerError::InvalidAmount(format!(
            "amount {amount} exceeds {decimals} decimal places"
        )));
    }
    Ok(())
}
