use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Ledger, LedgerError, Leg, TransactionKind};
use migration::MigratorTrait;

async fn ledger_with_db() -> (Ledger, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let ledger = Ledger::builder().database(db.clone()).build();
    (ledger, db)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS cnt FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "cnt").unwrap()
}

#[tokio::test]
async fn genesis_supply_credits_treasury() {
    let (ledger, _db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("1000"))
        .await
        .unwrap();

    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let balance = ledger.balance_of(treasury.id, asset.id).await.unwrap();
    assert_eq!(balance, dec("1000.00"));
}

#[tokio::test]
async fn create_without_supply_posts_nothing() {
    let (ledger, db) = ledger_with_db().await;

    ledger
        .create_asset("guild-1", "SILVER", "Silver", 0, Decimal::ZERO)
        .await
        .unwrap();

    assert_eq!(count_rows(&db, "transactions").await, 0);
    assert_eq!(count_rows(&db, "ledger_entries").await, 0);
}

#[tokio::test]
async fn issue_and_transfer_scenario() {
    let (ledger, _db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("1000"))
        .await
        .unwrap();
    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let alice = ledger.ensure_user_account("guild-1", "alice").await.unwrap();
    let bob = ledger.ensure_user_account("guild-1", "bob").await.unwrap();

    ledger
        .issue(
            "guild-1",
            treasury.id,
            alice.id,
            asset.id,
            dec("100.00"),
            "welcome grant",
        )
        .await
        .unwrap();

    assert_eq!(
        ledger.balance_of(treasury.id, asset.id).await.unwrap(),
        dec("900.00")
    );
    assert_eq!(
        ledger.balance_of(alice.id, asset.id).await.unwrap(),
        dec("100.00")
    );

    ledger
        .transfer(
            "guild-1",
            alice.id,
            bob.id,
            asset.id,
            dec("30.00"),
            "payment",
        )
        .await
        .unwrap();

    assert_eq!(
        ledger.balance_of(alice.id, asset.id).await.unwrap(),
        dec("70.00")
    );
    assert_eq!(
        ledger.balance_of(bob.id, asset.id).await.unwrap(),
        dec("30.00")
    );
    // Treasury untouched by the user-to-user transfer.
    assert_eq!(
        ledger.balance_of(treasury.id, asset.id).await.unwrap(),
        dec("900.00")
    );

    // Total supply is outstanding, so the asset cannot be retired.
    let err = ledger.delete_asset("guild-1", "GOLD").await.unwrap_err();
    assert!(matches!(err, LedgerError::AssetInUse(_)));
    assert!(ledger.asset_by_symbol("guild-1", "GOLD").await.is_ok());
}

#[tokio::test]
async fn unbalanced_post_is_rejected() {
    let (ledger, db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, Decimal::ZERO)
        .await
        .unwrap();
    let alice = ledger.ensure_user_account("guild-1", "alice").await.unwrap();
    let bob = ledger.ensure_user_account("guild-1", "bob").await.unwrap();

    let err = ledger
        .post(
            "guild-1",
            TransactionKind::Transfer,
            "broken",
            &[
                Leg::new(alice.id, asset.id, dec("-10.00")),
                Leg::new(bob.id, asset.id, dec("10.01")),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    assert_eq!(count_rows(&db, "transactions").await, 0);
    assert_eq!(count_rows(&db, "ledger_entries").await, 0);
}

#[tokio::test]
async fn balanced_multi_leg_post_commits() {
    let (ledger, db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("50"))
        .await
        .unwrap();
    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let alice = ledger.ensure_user_account("guild-1", "alice").await.unwrap();
    let bob = ledger.ensure_user_account("guild-1", "bob").await.unwrap();

    // One transaction fanning out to two recipients.
    ledger
        .post(
            "guild-1",
            TransactionKind::Issuance,
            "airdrop",
            &[
                Leg::new(treasury.id, asset.id, dec("-20.00")),
                Leg::new(alice.id, asset.id, dec("12.50")),
                Leg::new(bob.id, asset.id, dec("7.50")),
            ],
        )
        .await
        .unwrap();

    assert_eq!(
        ledger.balance_of(treasury.id, asset.id).await.unwrap(),
        dec("30.00")
    );
    assert_eq!(
        ledger.balance_of(alice.id, asset.id).await.unwrap(),
        dec("12.50")
    );
    assert_eq!(
        ledger.balance_of(bob.id, asset.id).await.unwrap(),
        dec("7.50")
    );
    // Genesis + airdrop.
    assert_eq!(count_rows(&db, "transactions").await, 2);
    assert_eq!(count_rows(&db, "ledger_entries").await, 4);
}

#[tokio::test]
async fn insufficient_balance_rolls_back_whole_transaction() {
    let (ledger, db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("1000"))
        .await
        .unwrap();
    let alice = ledger.ensure_user_account("guild-1", "alice").await.unwrap();
    let bob = ledger.ensure_user_account("guild-1", "bob").await.unwrap();

    let tx_before = count_rows(&db, "transactions").await;
    let entries_before = count_rows(&db, "ledger_entries").await;

    // The transaction row is inserted before the balance assertion; a failed
    // assertion must take it down with the rollback.
    let err = ledger
        .transfer("guild-1", alice.id, bob.id, asset.id, dec("5.00"), "broke")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance(_)));

    assert_eq!(count_rows(&db, "transactions").await, tx_before);
    assert_eq!(count_rows(&db, "ledger_entries").await, entries_before);
    assert_eq!(
        ledger.balance_of(alice.id, asset.id).await.unwrap(),
        Decimal::ZERO
    );
}

#[tokio::test]
async fn provisioning_is_idempotent() {
    let (ledger, db) = ledger_with_db().await;

    let first = ledger.ensure_user_account("guild-1", "alice").await.unwrap();
    let second = ledger.ensure_user_account("guild-1", "alice").await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.name, "user:alice");
    assert_eq!(count_rows(&db, "accounts").await, 1);
    assert_eq!(count_rows(&db, "principals").await, 1);

    // Same principal in another community gets its own account but reuses
    // the principal record.
    let other = ledger.ensure_user_account("guild-2", "alice").await.unwrap();
    assert_ne!(other.id, first.id);
    assert_eq!(other.principal_id, first.principal_id);
    assert_eq!(count_rows(&db, "principals").await, 1);

    let t1 = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let t2 = ledger.ensure_treasury_account("guild-1").await.unwrap();
    assert_eq!(t1.id, t2.id);
    let burn = ledger.ensure_burn_account("guild-1").await.unwrap();
    assert_ne!(burn.id, t1.id);

    assert_eq!(
        ledger
            .account_id_by_name("guild-1", "treasury")
            .await
            .unwrap(),
        t1.id
    );
    let err = ledger
        .account_id_by_name("guild-1", "user:nobody")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(_)));
}

#[tokio::test]
async fn symbol_unique_per_community() {
    let (ledger, _db) = ledger_with_db().await;

    ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, Decimal::ZERO)
        .await
        .unwrap();

    let err = ledger
        .create_asset("guild-1", "GOLD", "Other Gold", 0, Decimal::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateSymbol(_)));

    // Same symbol elsewhere is a different currency.
    ledger
        .create_asset("guild-2", "GOLD", "Gold Coin", 2, Decimal::ZERO)
        .await
        .unwrap();
}

#[tokio::test]
async fn invalid_asset_parameters_are_rejected() {
    let (ledger, db) = ledger_with_db().await;

    for symbol in ["", "GO LD", "gold!", "A23456789012345678"] {
        let err = ledger
            .create_asset("guild-1", symbol, "Bad", 2, Decimal::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidSymbol(_)), "{symbol:?}");
    }

    let err = ledger
        .create_asset("guild-1", "GOLD", "Gold", 9, Decimal::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    // Supply with more precision than the asset declares.
    let err = ledger
        .create_asset("guild-1", "GOLD", "Gold", 2, dec("10.005"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    assert_eq!(count_rows(&db, "assets").await, 0);
}

#[tokio::test]
async fn transfer_amount_validation() {
    let (ledger, _db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("100"))
        .await
        .unwrap();
    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let alice = ledger.ensure_user_account("guild-1", "alice").await.unwrap();

    for bad in ["0", "-5"] {
        let err = ledger
            .transfer("guild-1", treasury.id, alice.id, asset.id, dec(bad), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }

    // The engine does not re-round: three decimals on a two-decimal asset.
    let err = ledger
        .transfer(
            "guild-1",
            treasury.id,
            alice.id,
            asset.id,
            dec("1.005"),
            "x",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn self_transfer_is_an_auditable_noop() {
    let (ledger, db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("100"))
        .await
        .unwrap();
    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();

    let tx_before = count_rows(&db, "transactions").await;
    ledger
        .transfer(
            "guild-1",
            treasury.id,
            treasury.id,
            asset.id,
            dec("10.00"),
            "shuffle",
        )
        .await
        .unwrap();

    assert_eq!(
        ledger.balance_of(treasury.id, asset.id).await.unwrap(),
        dec("100.00")
    );
    assert_eq!(count_rows(&db, "transactions").await, tx_before + 1);
}

#[tokio::test]
async fn delete_guard_survives_transfers() {
    let (ledger, db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("100"))
        .await
        .unwrap();
    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let burn = ledger.ensure_burn_account("guild-1").await.unwrap();

    let err = ledger.delete_asset("guild-1", "GOLD").await.unwrap_err();
    assert!(matches!(err, LedgerError::AssetInUse(_)));

    // Transfers are zero-sum, so parking the whole supply on the burn
    // account does not change the asset total: still 100 outstanding.
    ledger
        .transfer(
            "guild-1",
            treasury.id,
            burn.id,
            asset.id,
            dec("100.00"),
            "retire",
        )
        .await
        .unwrap();

    let err = ledger.delete_asset("guild-1", "GOLD").await.unwrap_err();
    assert!(matches!(err, LedgerError::AssetInUse(_)));

    // The failed delete removed nothing.
    assert_eq!(count_rows(&db, "assets").await, 1);
    assert_eq!(count_rows(&db, "ledger_entries").await, 3);
}

#[tokio::test]
async fn delete_asset_zero_total_removes_rows() {
    let (ledger, db) = ledger_with_db().await;

    // No initial supply: total of zero entries is exactly zero.
    ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, Decimal::ZERO)
        .await
        .unwrap();

    ledger.delete_asset("guild-1", "GOLD").await.unwrap();

    let err = ledger.asset_by_symbol("guild-1", "GOLD").await.unwrap_err();
    assert!(matches!(err, LedgerError::AssetNotFound(_)));
    assert_eq!(count_rows(&db, "assets").await, 0);

    let err = ledger.delete_asset("guild-1", "GOLD").await.unwrap_err();
    assert!(matches!(err, LedgerError::AssetNotFound(_)));
}

#[tokio::test]
async fn holdings_filter_and_order() {
    let (ledger, _db) = ledger_with_db().await;

    let zinc = ledger
        .create_asset("guild-1", "ZINC", "Zinc", 0, dec("50"))
        .await
        .unwrap();
    let gold = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("100"))
        .await
        .unwrap();
    let _iron = ledger
        .create_asset("guild-1", "IRON", "Iron", 0, Decimal::ZERO)
        .await
        .unwrap();
    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let alice = ledger.ensure_user_account("guild-1", "alice").await.unwrap();

    ledger
        .issue("guild-1", treasury.id, alice.id, gold.id, dec("10.00"), "g")
        .await
        .unwrap();
    ledger
        .issue("guild-1", treasury.id, alice.id, zinc.id, dec("5"), "z")
        .await
        .unwrap();

    let holdings = ledger.balances_of(alice.id, "guild-1").await.unwrap();
    let summary: Vec<(String, Decimal)> = holdings
        .into_iter()
        .map(|(asset, balance)| (asset.symbol, balance))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("GOLD".to_string(), dec("10.00")),
            ("ZINC".to_string(), dec("5"))
        ]
    );

    // Drain ZINC from the treasury past zero via a second issuance, then
    // check the audit view keeps non-positive balances.
    ledger
        .issue("guild-1", treasury.id, alice.id, zinc.id, dec("45"), "z2")
        .await
        .unwrap();
    ledger
        .issue("guild-1", treasury.id, alice.id, zinc.id, dec("5"), "z3")
        .await
        .unwrap();

    let treasury_view = ledger.treasury_balances("guild-1").await.unwrap();
    let summary: Vec<(String, Decimal)> = treasury_view
        .into_iter()
        .map(|(asset, balance)| (asset.symbol, balance))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("GOLD".to_string(), dec("90.00")),
            ("ZINC".to_string(), dec("-5"))
        ]
    );

    // User holdings hide nothing here, but a zero balance disappears.
    let bob = ledger.ensure_user_account("guild-1", "bob").await.unwrap();
    assert!(ledger.balances_of(bob.id, "guild-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn treasury_view_empty_without_provisioning() {
    let (ledger, _db) = ledger_with_db().await;
    assert!(ledger.treasury_balances("ghost-town").await.unwrap().is_empty());
}

#[tokio::test]
async fn assets_list_ordered_by_symbol() {
    let (ledger, _db) = ledger_with_db().await;

    for symbol in ["ZINC", "GOLD", "IRON"] {
        ledger
            .create_asset("guild-1", symbol, symbol, 0, Decimal::ZERO)
            .await
            .unwrap();
    }
    ledger
        .create_asset("guild-2", "COPPER", "Copper", 0, Decimal::ZERO)
        .await
        .unwrap();

    let symbols: Vec<String> = ledger
        .list_assets("guild-1")
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.symbol)
        .collect();
    assert_eq!(symbols, vec!["GOLD", "IRON", "ZINC"]);
}

#[tokio::test]
async fn genesis_shape_is_enforced() {
    let (ledger, _db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, Decimal::ZERO)
        .await
        .unwrap();
    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let alice = ledger.ensure_user_account("guild-1", "alice").await.unwrap();

    // Two legs are not a genesis.
    let err = ledger
        .post(
            "guild-1",
            TransactionKind::Genesis,
            "bad genesis",
            &[
                Leg::new(treasury.id, asset.id, dec("10.00")),
                Leg::new(alice.id, asset.id, dec("10.00")),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    // A negative genesis leg is not currency entering existence.
    let err = ledger
        .post(
            "guild-1",
            TransactionKind::Genesis,
            "bad genesis",
            &[Leg::new(treasury.id, asset.id, dec("-10.00"))],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    // Empty postings are rejected for every kind.
    let err = ledger
        .post("guild-1", TransactionKind::Transfer, "empty", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[tokio::test]
async fn foreign_ids_are_not_found() {
    let (ledger, _db) = ledger_with_db().await;

    let asset = ledger
        .create_asset("guild-1", "GOLD", "Gold Coin", 2, dec("100"))
        .await
        .unwrap();
    let treasury = ledger.ensure_treasury_account("guild-1").await.unwrap();
    let stranger = ledger.ensure_user_account("guild-2", "mallory").await.unwrap();

    // Accounts from another community are invisible to this one.
    let err = ledger
        .transfer(
            "guild-1",
            treasury.id,
            stranger.id,
            asset.id,
            dec("1.00"),
            "x",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(_)));

    // So are assets.
    let err = ledger
        .transfer(
            "guild-2",
            stranger.id,
            stranger.id,
            asset.id,
            dec("1.00"),
            "x",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AssetNotFound(_)));
}
