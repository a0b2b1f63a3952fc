//! Account resolution: find-or-create provisioning of user and system
//! accounts.
//!
//! Provisioning is idempotent by construction: account names are
//! deterministic (`user:<principal>` for users, the reserved names for
//! treasury/burn) and each ensure call runs a find-or-create inside one
//! storage transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Account, AccountKind, BURN_ACCOUNT_NAME, LedgerError, Principal, ResultLedger,
    TREASURY_ACCOUNT_NAME, accounts, principals,
};

use super::{Ledger, with_tx};

impl Ledger {
    /// Idempotent find-or-create of a principal's account in a community.
    ///
    /// The first call provisions the backing principal record and the
    /// account together; both land in one commit or neither does.
    pub async fn ensure_user_account(
        &self,
        community_id: &str,
        principal_external_id: &str,
    ) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| {
            let principal = Self::ensure_principal_in(&db_tx, principal_external_id).await?;
            let name = accounts::user_account_name(principal_external_id);
            let account = Self::find_or_create_account_in(
                &db_tx,
                community_id,
                Some(principal.id),
                &name,
                AccountKind::User,
            )
            .await?;
            Ok(account)
        })
    }

    /// Idempotent find-or-create of the community treasury account.
    pub async fn ensure_treasury_account(&self, community_id: &str) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| {
            let account = Self::ensure_system_account_in(
                &db_tx,
                community_id,
                TREASURY_ACCOUNT_NAME,
                AccountKind::Treasury,
            )
            .await?;
            Ok(account)
        })
    }

    /// Idempotent find-or-create of the community burn account.
    pub async fn ensure_burn_account(&self, community_id: &str) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| {
            let account = Self::ensure_system_account_in(
                &db_tx,
                community_id,
                BURN_ACCOUNT_NAME,
                AccountKind::Burn,
            )
            .await?;
            Ok(account)
        })
    }

    /// Resolve an account id from its name within a community.
    pub async fn account_id_by_name(
        &self,
        community_id: &str,
        name: &str,
    ) -> ResultLedger<Uuid> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::CommunityId.eq(community_id))
            .filter(accounts::Column::Name.eq(name))
            .one(self.database())
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))?;
        let account = Account::try_from(model)?;
        Ok(account.id)
    }

    pub(crate) async fn ensure_system_account_in<C: ConnectionTrait>(
        conn: &C,
        community_id: &str,
        name: &str,
        kind: AccountKind,
    ) -> ResultLedger<Account> {
        Self::find_or_create_account_in(conn, community_id, None, name, kind).await
    }

    /// Load an account by id, scoped to a community.
    pub(crate) async fn require_account_in<C: ConnectionTrait>(
        conn: &C,
        community_id: &str,
        account_id: Uuid,
    ) -> ResultLedger<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
        let account = Account::try_from(model)?;
        if account.community_id != community_id {
            return Err(LedgerError::AccountNotFound(account_id.to_string()));
        }
        Ok(account)
    }

    async fn ensure_principal_in<C: ConnectionTrait>(
        conn: &C,
        external_id: &str,
    ) -> ResultLedger<Principal> {
        let existing = principals::Entity::find()
            .filter(principals::Column::ExternalId.eq(external_id))
            .one(conn)
            .await?;
        if let Some(model) = existing {
            return Principal::try_from(model);
        }

        let principal = Principal::new(external_id.to_string());
        principals::ActiveModel::from(&principal).insert(conn).await?;
        debug!(external_id, "provisioned principal record");
        Ok(principal)
    }

    async fn find_or_create_account_in<C: ConnectionTrait>(
        conn: &C,
        community_id: &str,
        principal_id: Option<Uuid>,
        name: &str,
        kind: AccountKind,
    ) -> ResultLedger<Account> {
        let existing = accounts::Entity::find()
            .filter(accounts::Column::CommunityId.eq(community_id))
            .filter(accounts::Column::Name.eq(name))
            .one(conn)
            .await?;
        if let Some(model) = existing {
            return Account::try_from(model);
        }

        let account = Account::new(
            community_id.to_string(),
            principal_id,
            name.to_string(),
            kind,
        );
        accounts::ActiveModel::from(&account).insert(conn).await?;
        debug!(community_id, name, kind = kind.as_str(), "provisioned account");
        Ok(account)
    }
}
