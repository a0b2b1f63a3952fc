//! Double-entry ledger engine for community-scoped currencies.
//!
//! Every value movement is a [`Transaction`] made of one or more signed
//! [`LedgerEntry`] rows. For every committed transaction the entries of each
//! asset sum to zero, with one documented exception: a
//! [`TransactionKind::Genesis`] transaction carries a single positive leg
//! crediting the treasury when a currency enters existence.
//!
//! Balances are never stored. [`Ledger::balance_of`] re-derives the balance
//! of an `(account, asset)` pair from its entries on every call, so a balance
//! can never drift from the entries that justify it.

pub use accounts::{Account, AccountKind, BURN_ACCOUNT_NAME, TREASURY_ACCOUNT_NAME};
pub use assets::Asset;
pub use entries::{LedgerEntry, Leg};
pub use error::LedgerError;
pub use ops::{Ledger, LedgerBuilder};
pub use principals::Principal;
pub use transactions::{Transaction, TransactionKind, ledger_now};

mod accounts;
mod amount;
mod assets;
mod entries;
mod error;
mod ops;
mod principals;
mod transactions;

type ResultLedger<T> = Result<T, LedgerError>;
