//! The [`Ledger`] handle and its operation surface.
//!
//! One `Ledger` wraps one [`DatabaseConnection`]; the hosting process owns
//! the connection lifecycle and injects it through [`LedgerBuilder`]. The
//! handle keeps no state of its own: every operation reads and writes the
//! store directly, so concurrent handles over the same database always see
//! the latest committed rows.

use sea_orm::DatabaseConnection;

mod accounts;
mod assets;
mod balances;
mod posting;

/// Run a block inside a DB transaction, committing on success and rolling
/// back (by drop) on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Handle over one ledger store.
#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Return a builder for `Ledger`.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    pub(crate) fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

/// The builder for `Ledger`.
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database. The schema must already be migrated.
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`.
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
        }
    }
}
