use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{
    Category, Engine, EngineError, ExpenseUpdate, NewExpense, NewMember, PaymentSource, SplitSpec,
    SplitType,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db: DatabaseConnection = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build()
}

async fn trip_with_members(engine: &Engine, names: &[&str]) -> (Uuid, Vec<Uuid>) {
    let inputs = names
        .iter()
        .map(|name| NewMember {
            name: name.to_string(),
            ..Default::default()
        })
        .collect();
    let trip = engine.new_trip("Goa", None, inputs).await.unwrap();
    let ids = engine
        .members(trip.id)
        .await
        .unwrap()
        .into_iter()
        .map(|member| member.id)
        .collect();
    (trip.id, ids)
}

fn equal_expense(paid_by: Uuid, amount: f64, description: &str) -> NewExpense {
    NewExpense {
        description: description.to_string(),
        amount: Some(amount),
        category: Category::Food,
        date: None,
        paid_by: Some(paid_by),
        spec: SplitSpec::Equal,
        settled: false,
        payment_source: PaymentSource::Member,
    }
}

#[tokio::test]
async fn trip_crud_round_trip() {
    let engine = engine_with_db().await;

    let trip = engine.new_trip("Goa", None, Vec::new()).await.unwrap();
    assert_eq!(engine.trips().await.unwrap().len(), 1);
    assert_eq!(engine.trip(trip.id).await.unwrap().name, "Goa");

    let renamed = engine
        .update_trip(trip.id, Some("Goa 2026"), None)
        .await
        .unwrap();
    assert_eq!(renamed.name, "Goa 2026");
    assert_eq!(renamed.start_date, trip.start_date);

    engine.delete_trip(trip.id).await.unwrap();
    assert_eq!(
        engine.trip(trip.id).await.unwrap_err(),
        EngineError::KeyNotFound("trip not exists".to_string())
    );
    assert!(engine.trips().await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_member_names_rejected() {
    let engine = engine_with_db().await;
    let (trip_id, _) = trip_with_members(&engine, &["José"]).await;

    let err = engine
        .add_member(trip_id, "  jose ", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine.add_member(trip_id, "Maria", None, None).await.unwrap();
    assert_eq!(engine.members(trip_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn blank_member_names_rejected() {
    let engine = engine_with_db().await;
    let (trip_id, _) = trip_with_members(&engine, &["Alice"]).await;

    let err = engine.add_member(trip_id, "   ", None, None).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidName("member name must not be empty".to_string())
    );

    let err = engine
        .new_trip(
            "Goa",
            None,
            vec![NewMember {
                name: "\t".to_string(),
                ..Default::default()
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
}

#[tokio::test]
async fn member_removal_guarded_while_referenced() {
    let engine = engine_with_db().await;
    let (trip_id, ids) = trip_with_members(&engine, &["Alice", "Bob", "Carol"]).await;

    let expense = engine
        .new_expense(trip_id, equal_expense(ids[0], 300.0, "dinner"))
        .await
        .unwrap();

    // Bob only appears in the splits, Alice also as payer; both are blocked.
    let err = engine.remove_member(trip_id, ids[1]).await.unwrap_err();
    assert_eq!(err, EngineError::MemberInUse("Bob".to_string()));
    let err = engine.remove_member(trip_id, ids[0]).await.unwrap_err();
    assert!(matches!(err, EngineError::MemberInUse(_)));

    engine.delete_expense(trip_id, expense.id).await.unwrap();
    engine.remove_member(trip_id, ids[1]).await.unwrap();
    assert_eq!(engine.members(trip_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn each_pays_own_derives_total_from_member_count() {
    let engine = engine_with_db().await;
    let (trip_id, ids) = trip_with_members(&engine, &["Alice", "Bob", "Carol"]).await;

    let expense = engine
        .new_expense(
            trip_id,
            NewExpense {
                description: "buffet".to_string(),
                amount: None,
                category: Category::Food,
                date: None,
                paid_by: Some(ids[0]),
                spec: SplitSpec::EachPaysOwn {
                    amount_per_person: 120.0,
                },
                settled: false,
                payment_source: PaymentSource::Member,
            },
        )
        .await
        .unwrap();

    assert_eq!(expense.amount, 360.0);
    assert_eq!(expense.amount_per_person, Some(120.0));
    assert_eq!(expense.split_type, SplitType::EachPaysOwn);
    assert_eq!(expense.splits.len(), 3);
    assert!(expense.splits.iter().all(|split| split.amount == 120.0));

    // Self-funded expenses never move balances.
    let (settlement, totals) = engine.settlement(trip_id).await.unwrap();
    assert!(settlement.transactions.is_empty());
    assert!(settlement.ledger.iter().all(|entry| entry.balance == 0.0));
    assert_eq!(totals.total_expense, 360.0);
}

#[tokio::test]
async fn settlement_through_the_engine() {
    let engine = engine_with_db().await;
    let (trip_id, ids) = trip_with_members(&engine, &["Jeevan", "Nagesh", "Rohit", "Akshay"]).await;

    engine
        .new_expense(trip_id, equal_expense(ids[0], 400.0, "dinner"))
        .await
        .unwrap();
    engine
        .new_expense(trip_id, equal_expense(ids[1], 380.0, "snacks"))
        .await
        .unwrap();

    let (settlement, totals) = engine.settlement(trip_id).await.unwrap();

    let balances: Vec<f64> = settlement.ledger.iter().map(|e| e.balance).collect();
    assert_eq!(balances, vec![205.0, 185.0, -195.0, -195.0]);

    let transfers: Vec<(String, String, f64)> = settlement
        .transactions
        .iter()
        .map(|t| (t.from.clone(), t.to.clone(), t.amount))
        .collect();
    assert_eq!(
        transfers,
        vec![
            ("Rohit".to_string(), "Jeevan".to_string(), 195.0),
            ("Akshay".to_string(), "Jeevan".to_string(), 10.0),
            ("Akshay".to_string(), "Nagesh".to_string(), 185.0),
        ]
    );

    assert_eq!(totals.total_expense, 780.0);
    assert_eq!(totals.category_wise.get("Food"), Some(&780.0));
}

#[tokio::test]
async fn expense_update_reallocates_only_when_needed() {
    let engine = engine_with_db().await;
    let (trip_id, ids) = trip_with_members(&engine, &["Alice", "Bob", "Carol"]).await;

    let expense = engine
        .new_expense(trip_id, equal_expense(ids[0], 300.0, "dinner"))
        .await
        .unwrap();
    assert!(expense.splits.iter().all(|split| split.amount == 100.0));

    // Changing the amount re-runs the allocator over the same equal split.
    let updated = engine
        .update_expense(
            trip_id,
            expense.id,
            ExpenseUpdate {
                amount: Some(90.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, 90.0);
    assert!(updated.splits.iter().all(|split| split.amount == 30.0));

    // A metadata-only update leaves the stored splits alone.
    let settled = engine
        .update_expense(
            trip_id,
            expense.id,
            ExpenseUpdate {
                settled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(settled.settled);
    assert_eq!(settled.splits, updated.splits);

    // Settled expenses drop out of the settlement entirely.
    let (settlement, _) = engine.settlement(trip_id).await.unwrap();
    assert!(settlement.transactions.is_empty());
    assert!(settlement.ledger.iter().all(|entry| entry.balance == 0.0));
}

#[tokio::test]
async fn expense_validation_errors() {
    let engine = engine_with_db().await;
    let (trip_id, ids) = trip_with_members(&engine, &["Alice", "Bob"]).await;

    let err = engine
        .new_expense(trip_id, equal_expense(Uuid::new_v4(), 100.0, "ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .new_expense(
            trip_id,
            NewExpense {
                amount: None,
                ..equal_expense(ids[0], 100.0, "dinner")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .new_expense(trip_id, equal_expense(ids[0], -5.0, "refund"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn pool_contributions_and_summary() {
    let engine = engine_with_db().await;
    let (trip_id, ids) = trip_with_members(&engine, &["Alice", "Bob"]).await;

    engine
        .add_contribution(trip_id, ids[0], 300.0, None, None)
        .await
        .unwrap();
    engine
        .add_contribution(trip_id, ids[1], 100.0, None, Some("fuel money".to_string()))
        .await
        .unwrap();

    engine
        .new_expense(
            trip_id,
            NewExpense {
                description: "toll".to_string(),
                amount: Some(100.0),
                category: Category::Travel,
                date: None,
                paid_by: None,
                spec: SplitSpec::Equal,
                settled: false,
                payment_source: PaymentSource::Pool,
            },
        )
        .await
        .unwrap();

    let summary = engine.pool_summary(trip_id).await.unwrap();
    assert_eq!(summary.total_contributions, 400.0);
    assert_eq!(summary.total_spent_from_pool, 100.0);
    assert_eq!(summary.remaining_balance, 300.0);
    assert_eq!(summary.contribution_count, 2);
    assert_eq!(summary.expense_count, 1);
    assert_eq!(summary.contributors.len(), 2);
    assert_eq!(summary.contributors[0].member.name, "Alice");
    assert_eq!(summary.contributors[0].return_amount, 225.0);
    assert_eq!(summary.contributors[1].return_amount, 75.0);

    // Pool expenses never touch individual balances.
    let (settlement, _) = engine.settlement(trip_id).await.unwrap();
    assert!(settlement.transactions.is_empty());

    let err = engine
        .add_contribution(trip_id, ids[0], 0.0, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    let err = engine
        .delete_contribution(trip_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn activity_feed_records_mutations() {
    let engine = engine_with_db().await;
    let (trip_id, ids) = trip_with_members(&engine, &["Alice"]).await;

    engine.add_member(trip_id, "Bob", None, None).await.unwrap();
    engine
        .new_expense(trip_id, equal_expense(ids[0], 80.0, "breakfast"))
        .await
        .unwrap();

    let feed = engine.activity(trip_id).await.unwrap();
    assert_eq!(feed.len(), 3);
    assert!(feed.iter().any(|entry| entry.message == "Bob joined the trip"));
    assert!(
        feed.iter()
            .any(|entry| entry.message == "Alice added 80.00 for \"breakfast\"")
    );
    assert!(
        feed.iter()
            .any(|entry| entry.message.contains("was created"))
    );
}
