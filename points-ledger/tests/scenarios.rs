//! End-to-end ledger scenarios
//!
//! Each scenario drives the async facade the same way the HTTP layer does.

use points_ledger::{Allocation, Config, Error, Ledger, PayerId, TransactionRequest, UserId};

async fn create_test_ledger() -> Ledger {
    Ledger::open(Config::default()).await.unwrap()
}

async fn add(ledger: &Ledger, user: &UserId, payer: &str, points: i64, timestamp: &str) {
    ledger
        .add_transaction(user, TransactionRequest::new(payer, points, timestamp))
        .await
        .unwrap();
}

fn alloc(payer: &str, points: i64) -> Allocation {
    Allocation {
        payer: PayerId::new(payer),
        points,
    }
}

#[tokio::test]
async fn test_single_transaction_balance() {
    let ledger = create_test_ledger().await;
    let user = UserId::new("1");

    add(&ledger, &user, "DANNON", 100, "2020-11-02T14:00:00Z").await;

    let balances = ledger.get_balances(&user).await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[&PayerId::new("DANNON")], 100);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_multiple_payers_balance() {
    let ledger = create_test_ledger().await;
    let user = UserId::new("2");

    add(&ledger, &user, "DANNON", 100, "2020-11-02T14:00:00Z").await;
    add(&ledger, &user, "UNILEVER", 123, "2020-11-02T14:00:00Z").await;
    add(&ledger, &user, "MILLER_COORS", 4000, "2020-11-02T14:00:00Z").await;
    add(&ledger, &user, "DANNON", 200, "2020-11-02T14:00:00Z").await;
    add(&ledger, &user, "MILLER_COORS", -200, "2020-11-02T14:00:00Z").await;

    let balances = ledger.get_balances(&user).await.unwrap();
    assert_eq!(balances[&PayerId::new("DANNON")], 300);
    assert_eq!(balances[&PayerId::new("UNILEVER")], 123);
    assert_eq!(balances[&PayerId::new("MILLER_COORS")], 3800);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_retroactive_correction_spend() {
    let ledger = create_test_ledger().await;
    let user = UserId::new("3");

    add(&ledger, &user, "DANNON", 300, "2020-10-31T10:00:00Z").await;
    add(&ledger, &user, "UNILEVER", 200, "2020-10-31T11:00:00Z").await;
    add(&ledger, &user, "DANNON", -100, "2020-10-31T15:00:00Z").await;

    let committed = ledger.spend(&user, 350).await.unwrap();
    assert_eq!(committed, vec![alloc("DANNON", -200), alloc("UNILEVER", -150)]);

    let balances = ledger.get_balances(&user).await.unwrap();
    assert_eq!(balances[&PayerId::new("DANNON")], 0);
    assert_eq!(balances[&PayerId::new("UNILEVER")], 50);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_chronological_multi_round_spend() {
    let ledger = create_test_ledger().await;
    let user = UserId::new("4");

    // Inserted out of timestamp order on purpose
    add(&ledger, &user, "DANNON", 1000, "2020-11-02T14:00:00Z").await;
    add(&ledger, &user, "UNILEVER", 200, "2020-10-31T11:00:00Z").await;
    add(&ledger, &user, "DANNON", -200, "2020-10-31T15:00:00Z").await;
    add(&ledger, &user, "MILLER_COORS", 10000, "2020-11-01T14:00:00Z").await;
    add(&ledger, &user, "DANNON", 300, "2020-10-31T10:00:00Z").await;

    // Round 1: DANNON's oldest 300 is cut to 100 by the correction
    let committed = ledger.spend(&user, 5000).await.unwrap();
    assert_eq!(
        committed,
        vec![
            alloc("DANNON", -100),
            alloc("UNILEVER", -200),
            alloc("MILLER_COORS", -4700),
        ]
    );

    let balances = ledger.get_balances(&user).await.unwrap();
    assert_eq!(balances[&PayerId::new("DANNON")], 1000);
    assert_eq!(balances[&PayerId::new("UNILEVER")], 0);
    assert_eq!(balances[&PayerId::new("MILLER_COORS")], 5300);

    // Round 2: what is left of MILLER_COORS goes before DANNON's newer grant.
    // Exhausted chunks still register their payer, so UNILEVER shows up at 0.
    let committed = ledger.spend(&user, 5600).await.unwrap();
    assert_eq!(
        committed,
        vec![
            alloc("DANNON", -300),
            alloc("UNILEVER", 0),
            alloc("MILLER_COORS", -5300),
        ]
    );

    let balances = ledger.get_balances(&user).await.unwrap();
    assert_eq!(balances[&PayerId::new("DANNON")], 700);
    assert_eq!(balances[&PayerId::new("UNILEVER")], 0);
    assert_eq!(balances[&PayerId::new("MILLER_COORS")], 0);

    // Round 3: not enough left, nothing changes
    let before = ledger.get_transactions(&user).await.unwrap();
    let err = ledger.spend(&user, 20000).await.unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientPoints { requested: 20000, available: 700 }
    ));
    assert_eq!(ledger.get_transactions(&user).await.unwrap(), before);
    assert_eq!(ledger.get_balances(&user).await.unwrap()[&PayerId::new("DANNON")], 700);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_users_do_not_share_points() {
    let ledger = create_test_ledger().await;
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");

    add(&ledger, &alice, "DANNON", 500, "2020-11-02T14:00:00Z").await;

    let err = ledger.spend(&bob, 100).await.unwrap_err();
    assert!(matches!(err, Error::InsufficientPoints { .. }));
    assert!(ledger.get_balances(&bob).await.unwrap().is_empty());
    assert_eq!(ledger.get_balances(&alice).await.unwrap()[&PayerId::new("DANNON")], 500);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_validation_failure_leaves_ledger_untouched() {
    let ledger = create_test_ledger().await;
    let user = UserId::new("5");

    let err = ledger
        .add_transaction(&user, TransactionRequest::new("", 100, "2020-11-02T14:00:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(ledger.get_transactions(&user).await.unwrap().is_empty());

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_balance_overflow_is_rejected_and_ledger_keeps_serving() {
    let ledger = create_test_ledger().await;
    let heavy = UserId::new("heavy");
    let other = UserId::new("other");

    add(&ledger, &heavy, "DANNON", i64::MAX, "2020-11-02T14:00:00Z").await;
    add(&ledger, &other, "UNILEVER", 50, "2020-11-02T14:00:00Z").await;

    let err = ledger
        .add_transaction(
            &heavy,
            TransactionRequest::new("DANNON", i64::MAX, "2020-11-02T15:00:00Z"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let balances = ledger.get_balances(&heavy).await.unwrap();
    assert_eq!(balances[&PayerId::new("DANNON")], i64::MAX);

    let balances = ledger.get_balances(&other).await.unwrap();
    assert_eq!(balances[&PayerId::new("UNILEVER")], 50);
    assert_eq!(ledger.spend(&other, 50).await.unwrap(), vec![alloc("UNILEVER", -50)]);

    ledger.shutdown().await.unwrap();
}
