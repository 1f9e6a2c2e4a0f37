//! Integration tests for the User repository using in-memory SurrealDB.

use lyceum_core::error::LyceumError;
use lyceum_core::models::address::Address;
use lyceum_core::models::institute::CreateInstitute;
use lyceum_core::models::user::{CreateUser, Profile, UpdateUser};
use lyceum_core::repository::{EmployeeRepository, InstituteRepository, UserRepository};
use lyceum_db::repository::{
    SurrealEmployeeRepository, SurrealInstituteRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    lyceum_db::run_migrations(&db).await.unwrap();
    db
}

fn address() -> Address {
    Address {
        postal_code: Some("50000000".into()),
        country: Some("Brazil".into()),
        state: "PE".into(),
        city: "Recife".into(),
        neighborhood: None,
        street: None,
        number: None,
        complement: None,
    }
}

fn user_input(email: &str, profile: Profile) -> CreateUser {
    CreateUser {
        email: email.into(),
        name: "Ada Lovelace".into(),
        phone_number: "81987654321".into(),
        profile,
        password_hash: None,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(user_input("ada@example.com", Profile::Employee))
        .await
        .unwrap();

    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.profile, Profile::Employee);
    assert!(!user.activation_status);
    assert!(user.password_hash.is_none());
    assert!(user.token.is_none());

    let by_id = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(by_id.id, user.id);

    let by_email = repo.get_by_email("ada@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let err = repo.get_by_email("ghost@example.com").await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
}

#[tokio::test]
async fn update_sets_and_clears_fields() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(user_input("bob@example.com", Profile::Employee))
        .await
        .unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                name: Some("Bob Updated".into()),
                token: Some(Some("a-token".into())),
                activation_status: Some(true),
                ..UpdateUser::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Bob Updated");
    assert_eq!(updated.token.as_deref(), Some("a-token"));
    assert!(updated.activation_status);
    // Untouched fields survive.
    assert_eq!(updated.email, "bob@example.com");

    let cleared = repo
        .update(
            user.id,
            UpdateUser {
                token: Some(None),
                ..UpdateUser::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.token.is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected_by_the_store() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(user_input("dup@example.com", Profile::Employee))
        .await
        .unwrap();
    let err = repo
        .create(user_input("dup@example.com", Profile::Student))
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Database(_)));
}

#[tokio::test]
async fn delete_cascades_the_employee_record() {
    let db = setup().await;
    let institutes = SurrealInstituteRepository::new(db.clone());
    let employees = SurrealEmployeeRepository::new(db.clone());
    let users = SurrealUserRepository::new(db);

    let (institute, _) = institutes
        .create_with_admin(
            CreateInstitute {
                cnpj: "11222333000181".into(),
                trading_name: "Lyceum".into(),
                corporate_name: "Lyceum LTDA".into(),
                address: address(),
            },
            user_input("admin@example.com", Profile::Institute),
            Some("director".into()),
        )
        .await
        .unwrap();

    let (user, employee) = employees
        .create_with_user(
            user_input("worker@example.com", Profile::Employee),
            institute.id,
            None,
        )
        .await
        .unwrap();
    assert_eq!(employee.institute_id, institute.id);

    users.delete(user.id).await.unwrap();

    let err = users.get_by_id(user.id).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
    assert!(employees.find_by_user(user.id).await.unwrap().is_none());
}
