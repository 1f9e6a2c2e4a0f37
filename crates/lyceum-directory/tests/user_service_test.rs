//! Integration tests for self-service account operations and the
//! deactivation policy.

use lyceum_core::error::LyceumError;
use lyceum_core::models::address::Address;
use lyceum_core::models::institute::CreateInstitute;
use lyceum_core::models::user::{CreateUser, Profile, User};
use lyceum_core::repository::{EmployeeRepository, InstituteRepository, UserRepository};
use lyceum_db::repository::{
    SurrealEmployeeRepository, SurrealInstituteRepository, SurrealStudentRepository,
    SurrealUserRepository,
};
use lyceum_directory::UserService;
use lyceum_directory::user::UpdateProfile;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

struct Fixture {
    service: UserService<
        SurrealUserRepository<Db>,
        SurrealEmployeeRepository<Db>,
        SurrealStudentRepository<Db>,
        SurrealInstituteRepository<Db>,
    >,
    institutes: SurrealInstituteRepository<Db>,
    employees: SurrealEmployeeRepository<Db>,
    users: SurrealUserRepository<Db>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    lyceum_db::run_migrations(&db).await.unwrap();

    Fixture {
        service: UserService::new(
            SurrealUserRepository::new(db.clone()),
            SurrealEmployeeRepository::new(db.clone()),
            SurrealStudentRepository::new(db.clone()),
            SurrealInstituteRepository::new(db.clone()),
        ),
        institutes: SurrealInstituteRepository::new(db.clone()),
        employees: SurrealEmployeeRepository::new(db.clone()),
        users: SurrealUserRepository::new(db),
    }
}

fn address() -> Address {
    Address {
        postal_code: None,
        country: None,
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
        name: "Ada".into(),
        phone_number: "81987654321".into(),
        profile,
        password_hash: None,
    }
}

async fn make_tenant(fixture: &Fixture, cnpj: &str, admin_email: &str) -> User {
    let (_, admin) = fixture
        .institutes
        .create_with_admin(
            CreateInstitute {
                cnpj: cnpj.into(),
                trading_name: "Lyceum".into(),
                corporate_name: "Lyceum LTDA".into(),
                address: address(),
            },
            user_input(admin_email, Profile::Institute),
            None,
        )
        .await
        .unwrap();
    admin
}

async fn hire(fixture: &Fixture, admin: &User, email: &str) -> User {
    let institute_id = fixture
        .employees
        .find_by_user(admin.id)
        .await
        .unwrap()
        .unwrap()
        .institute_id;
    let (user, _) = fixture
        .employees
        .create_with_user(user_input(email, Profile::Employee), institute_id, None)
        .await
        .unwrap();
    user
}

#[tokio::test]
async fn profile_operations_act_on_the_resolved_identity_only() {
    let fixture = setup().await;
    let admin = make_tenant(&fixture, "11222333000181", "admin@example.com").await;

    assert_eq!(fixture.service.profile(&admin).id, admin.id);

    let updated = fixture
        .service
        .update_profile(
            &admin,
            UpdateProfile {
                name: Some("Admin Renamed".into()),
                ..UpdateProfile::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, admin.id);
    assert_eq!(updated.name, "Admin Renamed");

    let err = fixture
        .service
        .update_profile(
            &admin,
            UpdateProfile {
                email: Some("not-an-email".into()),
                ..UpdateProfile::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Validation { field: "email", .. }));
}

#[tokio::test]
async fn changing_email_to_a_taken_address_conflicts() {
    let fixture = setup().await;
    let admin = make_tenant(&fixture, "11222333000181", "admin@example.com").await;
    let worker = hire(&fixture, &admin, "worker@example.com").await;

    let err = fixture
        .service
        .update_profile(
            &worker,
            UpdateProfile {
                email: Some("admin@example.com".into()),
                ..UpdateProfile::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::AlreadyExists { .. }));
}

#[tokio::test]
async fn deactivation_policy_self_and_same_institute_admin() {
    let fixture = setup().await;
    let admin = make_tenant(&fixture, "11222333000181", "admin@example.com").await;
    let worker = hire(&fixture, &admin, "worker@example.com").await;
    let peer = hire(&fixture, &admin, "peer@example.com").await;

    // Self-deactivation is allowed.
    let worker_after = fixture.service.deactivate(&worker, worker.id).await.unwrap();
    assert!(!worker_after.activation_status);

    // A same-institute admin may deactivate a peer.
    let peer_after = fixture.service.deactivate(&admin, peer.id).await.unwrap();
    assert!(!peer_after.activation_status);

    // A plain employee may not deactivate a peer.
    let err = fixture.service.deactivate(&worker, peer.id).await.unwrap_err();
    assert!(matches!(err, LyceumError::DeactivationForbidden));
}

#[tokio::test]
async fn cross_institute_deactivation_is_forbidden() {
    let fixture = setup().await;
    let admin_a = make_tenant(&fixture, "11222333000181", "admin-a@example.com").await;
    let admin_b = make_tenant(&fixture, "11444777000161", "admin-b@example.com").await;
    let worker_b = hire(&fixture, &admin_b, "worker-b@example.com").await;

    let err = fixture
        .service
        .deactivate(&admin_a, worker_b.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::DeactivationForbidden));

    // The target record is untouched.
    fixture.users.get_by_id(worker_b.id).await.unwrap();

    let err = fixture
        .service
        .deactivate(&admin_a, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
}

#[tokio::test]
async fn employee_account_deletion_is_scoped_to_the_account() {
    let fixture = setup().await;
    let admin = make_tenant(&fixture, "11222333000181", "admin@example.com").await;
    let worker = hire(&fixture, &admin, "worker@example.com").await;

    fixture.service.delete_account(&worker).await.unwrap();

    let err = fixture.users.get_by_id(worker.id).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
    // The institute and its admin survive.
    fixture.users.get_by_id(admin.id).await.unwrap();
}

#[tokio::test]
async fn institute_admin_account_deletion_tears_down_the_tenant() {
    let fixture = setup().await;
    let admin = make_tenant(&fixture, "11222333000181", "admin@example.com").await;
    let worker = hire(&fixture, &admin, "worker@example.com").await;
    let institute_id = fixture
        .employees
        .find_by_user(admin.id)
        .await
        .unwrap()
        .unwrap()
        .institute_id;

    fixture.service.delete_account(&admin).await.unwrap();

    let err = fixture.institutes.get_by_id(institute_id).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
    let err = fixture.users.get_by_id(worker.id).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
}
