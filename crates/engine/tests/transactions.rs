use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BudgetInput, Engine, EngineError, TransactionInput, TransactionKind, TransactionListFilter,
    TransactionPatch,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (email, name) in [("alice@example.com", "Alice"), ("bob@example.com", "Bob")] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (email, password_hash, name, is_admin, created_at) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                email.into(),
                "x".into(),
                name.into(),
                false.into(),
                Utc::now().into(),
            ],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

const ALICE: i32 = 1;
const BOB: i32 = 2;

fn expense(amount: i64, date: &str) -> TransactionInput {
    TransactionInput {
        amount: Some(amount),
        date: Some(date.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn first_transaction_creates_default_budget_and_uncategorized() {
    let (engine, _db) = engine_with_db().await;

    let tx = engine
        .create_transaction(ALICE, expense(150_000, "2026-04-01"))
        .await
        .unwrap();

    assert_eq!(tx.kind, TransactionKind::Expense);
    assert_eq!(tx.amount, 150_000);
    assert_eq!(tx.category, "Uncategorized");
    assert_eq!(tx.date, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());

    let budgets = engine.list_budgets(ALICE).await.unwrap();
    assert_eq!(budgets.len(), 1);
    let budget = &budgets[0];
    assert_eq!(Some(budget.id), tx.budget_id);
    assert_eq!(budget.name, "Default Budget April 2026");
    assert_eq!(budget.amount, 0);
    assert_eq!(budget.spent, 150_000);
    assert_eq!(
        budget.description.as_deref(),
        Some("Default budget created automatically")
    );

    // A second transaction reuses the budget instead of creating another one.
    engine
        .create_transaction(ALICE, expense(5_000, "2026-04-02"))
        .await
        .unwrap();
    assert_eq!(engine.list_budgets(ALICE).await.unwrap().len(), 1);
}

#[tokio::test]
async fn transaction_picks_budget_covering_its_date() {
    let (engine, _db) = engine_with_db().await;
    let march = engine
        .create_budget(
            ALICE,
            BudgetInput {
                amount: Some(1_000_000),
                start_date: Some("2026-03-01".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let april = engine
        .create_budget(
            ALICE,
            BudgetInput {
                amount: Some(2_000_000),
                start_date: Some("2026-04-01".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let tx = engine
        .create_transaction(ALICE, expense(10, "2026-04-15"))
        .await
        .unwrap();
    assert_eq!(tx.budget_id, Some(april.id));

    let tx = engine
        .create_transaction(ALICE, expense(10, "2026-03-15"))
        .await
        .unwrap();
    assert_eq!(tx.budget_id, Some(march.id));
}

#[tokio::test]
async fn category_name_is_reused_case_insensitively() {
    let (engine, _db) = engine_with_db().await;

    let first = engine
        .create_transaction(
            ALICE,
            TransactionInput {
                category: Some("Makanan".to_string()),
                ..expense(20_000, "2026-04-01")
            },
        )
        .await
        .unwrap();
    let second = engine
        .create_transaction(
            ALICE,
            TransactionInput {
                category: Some("  makanan ".to_string()),
                ..expense(30_000, "2026-04-02")
            },
        )
        .await
        .unwrap();

    assert_eq!(first.category_id, second.category_id);
    assert_eq!(second.category, "Makanan");
}

#[tokio::test]
async fn transaction_type_must_match_category_type() {
    let (engine, _db) = engine_with_db().await;
    let salary = engine
        .create_category(ALICE, "Gaji", "income")
        .await
        .unwrap();

    let err = engine
        .create_transaction(
            ALICE,
            TransactionInput {
                category_id: Some(salary.id),
                ..expense(10, "2026-04-01")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KindMismatch(_)));

    let ok = engine
        .create_transaction(
            ALICE,
            TransactionInput {
                category_id: Some(salary.id),
                kind: Some("income".to_string()),
                ..expense(5_000_000, "2026-04-01")
            },
        )
        .await
        .unwrap();
    assert_eq!(ok.kind, TransactionKind::Income);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_transaction(ALICE, TransactionInput::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::MissingField("Amount is required".to_string())
    );

    let err = engine
        .create_transaction(ALICE, expense(10, "01/04/2026"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));

    let err = engine
        .create_transaction(
            ALICE,
            TransactionInput {
                kind: Some("transfer".to_string()),
                ..expense(10, "2026-04-01")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidKind(_)));
}

#[tokio::test]
async fn date_defaults_to_today() {
    let (engine, _db) = engine_with_db().await;
    let tx = engine
        .create_transaction(
            ALICE,
            TransactionInput {
                amount: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tx.date, Utc::now().date_naive());
}

#[tokio::test]
async fn list_is_newest_first_and_filtered() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_transaction(ALICE, expense(1, "2026-04-01"))
        .await
        .unwrap();
    engine
        .create_transaction(ALICE, expense(2, "2026-04-03"))
        .await
        .unwrap();
    engine
        .create_transaction(
            ALICE,
            TransactionInput {
                kind: Some("income".to_string()),
                ..expense(3, "2026-04-02")
            },
        )
        .await
        .unwrap();
    engine
        .create_transaction(BOB, expense(99, "2026-04-02"))
        .await
        .unwrap();

    let all = engine
        .list_transactions(ALICE, &TransactionListFilter::default())
        .await
        .unwrap();
    let amounts: Vec<i64> = all.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![2, 3, 1]);

    let expenses = engine
        .list_transactions(
            ALICE,
            &TransactionListFilter {
                kind: Some(TransactionKind::Expense),
                from: Some("2026-04-02".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].amount, 2);

    let err = engine
        .list_transactions(
            ALICE,
            &TransactionListFilter {
                from: Some("2026-04-03".to_string()),
                to: Some("2026-04-01".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));

    let err = engine
        .list_transactions(
            ALICE,
            &TransactionListFilter {
                to: Some("2026-13-01".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidDate("Invalid date '2026-13-01', expected YYYY-MM-DD".to_string())
    );
}

#[tokio::test]
async fn list_is_paged_by_limit_and_offset() {
    let (engine, _db) = engine_with_db().await;
    for day in 1..=5 {
        engine
            .create_transaction(ALICE, expense(day, &format!("2026-05-{day:02}")))
            .await
            .unwrap();
    }

    let page = |limit, offset| TransactionListFilter {
        limit,
        offset,
        ..Default::default()
    };
    let amounts = |list: Vec<engine::Transaction>| list.iter().map(|t| t.amount).collect::<Vec<_>>();

    let first = engine
        .list_transactions(ALICE, &page(Some(2), None))
        .await
        .unwrap();
    assert_eq!(amounts(first), vec![5, 4]);

    let second = engine
        .list_transactions(ALICE, &page(Some(2), Some(2)))
        .await
        .unwrap();
    assert_eq!(amounts(second), vec![3, 2]);

    let past_end = engine
        .list_transactions(ALICE, &page(None, Some(10)))
        .await
        .unwrap();
    assert!(past_end.is_empty());

    let err = engine
        .list_transactions(ALICE, &page(Some(0), None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn list_limit_defaults_to_100_and_is_capped_at_500() {
    let (engine, db) = engine_with_db().await;
    engine
        .create_transaction(ALICE, expense(1, "2026-06-01"))
        .await
        .unwrap();
    // 1 row doubled ten times.
    let backend = db.get_database_backend();
    for _ in 0..10 {
        db.execute(Statement::from_string(
            backend,
            "INSERT INTO transactions \
             (user_id, category_id, budget_id, kind, amount, description, date, created_at) \
             SELECT user_id, category_id, budget_id, kind, amount, description, date, created_at \
             FROM transactions"
                .to_string(),
        ))
        .await
        .unwrap();
    }
    let default_page = engine
        .list_transactions(ALICE, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(default_page.len(), 100);

    let capped = engine
        .list_transactions(
            ALICE,
            &TransactionListFilter {
                limit: Some(10_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(capped.len(), 500);
}

#[tokio::test]
async fn offset_beyond_i64_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .list_transactions(
            ALICE,
            &TransactionListFilter {
                offset: Some(u64::MAX),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("offset out of range".to_string())
    );

    let ok = engine
        .list_transactions(
            ALICE,
            &TransactionListFilter {
                offset: Some(i64::MAX as u64),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(ok.is_empty());
}

#[tokio::test]
async fn update_is_partial() {
    let (engine, _db) = engine_with_db().await;
    let tx = engine
        .create_transaction(
            ALICE,
            TransactionInput {
                description: Some("Makan siang".to_string()),
                ..expense(150_000, "2026-04-01")
            },
        )
        .await
        .unwrap();

    let err = engine
        .update_transaction(ALICE, tx.id, TransactionPatch::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::MissingField("No fields to update".to_string())
    );

    let updated = engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                amount: Some(175_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, 175_000);
    assert_eq!(updated.description.as_deref(), Some("Makan siang"));
    assert_eq!(updated.date, tx.date);

    // Switching to income keeps an expense category: rejected.
    let err = engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                kind: Some("income".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KindMismatch(_)));

    let switched = engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                kind: Some("income".to_string()),
                category: Some("Bonus".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(switched.kind, TransactionKind::Income);
    assert_eq!(switched.category, "Bonus");
}

#[tokio::test]
async fn other_users_transactions_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let tx = engine
        .create_transaction(ALICE, expense(10, "2026-04-01"))
        .await
        .unwrap();
    let not_found = EngineError::KeyNotFound("Transaction not found".to_string());

    assert_eq!(engine.transaction(BOB, tx.id).await.unwrap_err(), not_found);
    assert_eq!(
        engine
            .update_transaction(
                BOB,
                tx.id,
                TransactionPatch {
                    amount: Some(1),
                    ..Default::default()
                }
            )
            .await
            .unwrap_err(),
        not_found
    );
    assert_eq!(
        engine.delete_transaction(BOB, tx.id).await.unwrap_err(),
        not_found
    );

    // Bob cannot book on Alice's budget either.
    let err = engine
        .create_transaction(
            BOB,
            TransactionInput {
                budget_id: tx.budget_id,
                ..expense(10, "2026-04-01")
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("Budget not found".to_string()));
}

#[tokio::test]
async fn delete_then_delete_again_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let tx = engine
        .create_transaction(ALICE, expense(10, "2026-04-01"))
        .await
        .unwrap();

    engine.delete_transaction(ALICE, tx.id).await.unwrap();
    assert!(matches!(
        engine.delete_transaction(ALICE, tx.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn monthly_totals_split_income_and_expense() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_transaction(ALICE, expense(150_000, "2026-04-01"))
        .await
        .unwrap();
    engine
        .create_transaction(ALICE, expense(50_000, "2026-04-30"))
        .await
        .unwrap();
    engine
        .create_transaction(
            ALICE,
            TransactionInput {
                kind: Some("income".to_string()),
                ..expense(5_000_000, "2026-04-25")
            },
        )
        .await
        .unwrap();
    // Outside the month and another user's: ignored.
    engine
        .create_transaction(ALICE, expense(7, "2026-05-01"))
        .await
        .unwrap();
    engine
        .create_transaction(BOB, expense(9, "2026-04-10"))
        .await
        .unwrap();

    let totals = engine.monthly_totals(ALICE, 2026, 4).await.unwrap();
    assert_eq!(totals.total_income, 5_000_000);
    assert_eq!(totals.total_expense, 200_000);
    assert_eq!(totals.balance(), 4_800_000);
}

#[tokio::test]
async fn monthly_totals_of_empty_month_are_zero() {
    let (engine, _db) = engine_with_db().await;
    let today = Utc::now().date_naive();

    let totals = engine
        .monthly_totals(ALICE, today.year(), today.month())
        .await
        .unwrap();
    assert_eq!(totals.total_income, 0);
    assert_eq!(totals.total_expense, 0);

    assert!(matches!(
        engine.monthly_totals(ALICE, 2026, 13).await,
        Err(EngineError::InvalidDate(_))
    ));
}

#[tokio::test]
async fn category_totals_group_by_category() {
    let (engine, _db) = engine_with_db().await;
    for (name, amount, date) in [
        ("Makanan", 100, "2026-04-01"),
        ("Makanan", 50, "2026-04-02"),
        ("Transportasi", 500, "2026-04-03"),
        ("Makanan", 1, "2026-05-01"),
    ] {
        engine
            .create_transaction(
                ALICE,
                TransactionInput {
                    category: Some(name.to_string()),
                    ..expense(amount, date)
                },
            )
            .await
            .unwrap();
    }

    let all_time = engine.category_totals(ALICE, None, None).await.unwrap();
    let pairs: Vec<(&str, i64)> = all_time
        .iter()
        .map(|t| (t.category.as_str(), t.total))
        .collect();
    assert_eq!(pairs, vec![("Transportasi", 500), ("Makanan", 151)]);

    let april = engine
        .category_totals(ALICE, Some((2026, 4)), Some(TransactionKind::Expense))
        .await
        .unwrap();
    let makanan = april.iter().find(|t| t.category == "Makanan").unwrap();
    assert_eq!(makanan.total, 150);

    assert!(
        engine
            .category_totals(BOB, None, None)
            .await
            .unwrap()
            .is_empty()
    );
}
