use sea_orm::Database;

use engine::{Engine, EngineError};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

#[tokio::test]
async fn register_then_login() {
    let engine = engine().await;

    let user = engine
        .register_user(" Siti@Example.com ", "rahasia", "Siti")
        .await
        .unwrap();
    assert_eq!(user.email, "siti@example.com");
    assert_eq!(user.name, "Siti");
    assert!(!user.is_admin);

    let logged = engine
        .authenticate("SITI@example.com", "rahasia")
        .await
        .unwrap();
    assert_eq!(logged.id, user.id);
}

#[tokio::test]
async fn register_rejects_bad_input() {
    let engine = engine().await;

    assert_eq!(
        engine.register_user("", "rahasia", "Siti").await.unwrap_err(),
        EngineError::MissingField("Email, password, and name are required".to_string())
    );
    assert!(matches!(
        engine.register_user("not-an-email", "rahasia", "Siti").await,
        Err(EngineError::InvalidEmail(_))
    ));
    assert!(matches!(
        engine.register_user("siti@example.com", "abc", "Siti").await,
        Err(EngineError::InvalidPassword(_))
    ));

    engine
        .register_user("siti@example.com", "rahasia", "Siti")
        .await
        .unwrap();
    assert_eq!(
        engine
            .register_user("SITI@example.com", "lainnya", "Siti 2")
            .await
            .unwrap_err(),
        EngineError::ExistingKey("Email already registered".to_string())
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let engine = engine().await;
    engine
        .register_user("budi@example.com", "rahasia", "Budi")
        .await
        .unwrap();

    assert_eq!(
        engine
            .authenticate("budi@example.com", "salah123")
            .await
            .unwrap_err(),
        EngineError::InvalidCredentials
    );
    assert_eq!(
        engine
            .authenticate("nobody@example.com", "rahasia")
            .await
            .unwrap_err(),
        EngineError::InvalidCredentials
    );
    assert!(matches!(
        engine.authenticate("budi@example.com", "").await,
        Err(EngineError::MissingField(_))
    ));
}

#[tokio::test]
async fn profile_update_changes_name_and_password() {
    let engine = engine().await;
    let user = engine
        .register_user("budi@example.com", "rahasia", "Budi")
        .await
        .unwrap();

    assert!(matches!(
        engine.update_profile(user.id, None, None).await,
        Err(EngineError::MissingField(_))
    ));

    let updated = engine
        .update_profile(user.id, Some("Budi Santoso"), Some("baru1234"))
        .await
        .unwrap();
    assert_eq!(updated.name, "Budi Santoso");

    assert_eq!(
        engine
            .authenticate("budi@example.com", "rahasia")
            .await
            .unwrap_err(),
        EngineError::InvalidCredentials
    );
    engine
        .authenticate("budi@example.com", "baru1234")
        .await
        .unwrap();
}

#[tokio::test]
async fn admins_are_created_explicitly() {
    let engine = engine().await;
    let admin = engine
        .create_user("root@example.com", "rahasia", "Root", true)
        .await
        .unwrap();
    engine
        .register_user("budi@example.com", "rahasia", "Budi")
        .await
        .unwrap();

    let users = engine.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, admin.id);
    assert!(users[0].is_admin);
    assert!(!users[1].is_admin);
}

#[tokio::test]
async fn notifications_are_listed_newest_first_per_user() {
    let engine = engine().await;
    let siti = engine
        .register_user("siti@example.com", "rahasia", "Siti")
        .await
        .unwrap();
    let budi = engine
        .register_user("budi@example.com", "rahasia", "Budi")
        .await
        .unwrap();

    engine
        .create_notification(siti.id, "Budget hampir habis")
        .await
        .unwrap();
    engine
        .create_notification(siti.id, "Gaji masuk")
        .await
        .unwrap();
    engine
        .create_notification(budi.id, "Selamat datang")
        .await
        .unwrap();

    let listed = engine.list_notifications(siti.id).await.unwrap();
    let messages: Vec<&str> = listed.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(messages, vec!["Gaji masuk", "Budget hampir habis"]);

    assert!(matches!(
        engine.create_notification(siti.id, "  ").await,
        Err(EngineError::MissingField(_))
    ));
    assert_eq!(
        engine.create_notification(999, "hi").await.unwrap_err(),
        EngineError::KeyNotFound("User not found".to_string())
    );
}
