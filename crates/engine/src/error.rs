//! The module contains the errors the ledger engine can throw.
//!
//! Mutation paths roll back their enclosing storage transaction before any
//! of these surface, so a returned error never leaves partial writes behind.
//! Read paths return [`AssetNotFound`]/[`AccountNotFound`] or an empty result
//! set; they never error for "no data".
//!
//! [`AssetNotFound`]: LedgerError::AssetNotFound
//! [`AccountNotFound`]: LedgerError::AccountNotFound

use sea_orm::DbErr;
use thiserror::Error;

/// Ledger engine custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),
    #[error("symbol \"{0}\" already present!")]
    DuplicateSymbol(String),
    #[error("asset \"{0}\" not found!")]
    AssetNotFound(String),
    #[error("asset in use: {0}")]
    AssetInUse(String),
    #[error("account \"{0}\" not found!")]
    AccountNotFound(String),
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("storage failure: {0}")]
    Storage(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidSymbol(a), Self::InvalidSymbol(b)) => a == b,
            (Self::DuplicateSymbol(a), Self::DuplicateSymbol(b)) => a == b,
            (Self::AssetNotFound(a), Self::AssetNotFound(b)) => a == b,
            (Self::AssetInUse(a), Self::AssetInUse(b)) => a == b,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
