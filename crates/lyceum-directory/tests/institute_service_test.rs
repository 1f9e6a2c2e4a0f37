//! Integration tests for institute registration and self-scoped
//! tenant management.

use lyceum_auth::config::AuthConfig;
use lyceum_auth::mail::LogMailer;
use lyceum_core::error::LyceumError;
use lyceum_core::models::address::{Address, UpdateAddress};
use lyceum_core::models::institute::UpdateInstitute;
use lyceum_core::models::user::Profile;
use lyceum_core::query::QueryParams;
use lyceum_core::repository::InstituteRepository;
use lyceum_db::repository::{
    SurrealEmployeeRepository, SurrealInstituteRepository, SurrealUserRepository,
};
use lyceum_directory::institute::{AdminAccount, RegisterInstitute};
use lyceum_directory::InstituteService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

type Service = InstituteService<
    SurrealInstituteRepository<Db>,
    SurrealEmployeeRepository<Db>,
    SurrealUserRepository<Db>,
    LogMailer,
>;

async fn setup() -> (Service, SurrealInstituteRepository<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    lyceum_db::run_migrations(&db).await.unwrap();

    let institutes = SurrealInstituteRepository::new(db.clone());
    let service = InstituteService::new(
        institutes.clone(),
        SurrealEmployeeRepository::new(db.clone()),
        SurrealUserRepository::new(db),
        LogMailer,
        AuthConfig {
            secret_key: "institute-test-secret".into(),
            ..AuthConfig::default()
        },
    );
    (service, institutes)
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

fn register_input(cnpj: &str, admin_email: &str, trading_name: &str) -> RegisterInstitute {
    RegisterInstitute {
        cnpj: cnpj.into(),
        trading_name: trading_name.into(),
        corporate_name: format!("{trading_name} LTDA"),
        address: address(),
        admin: AdminAccount {
            name: "Grace Hopper".into(),
            email: admin_email.into(),
            phone_number: "81987654321".into(),
            role: Some("director".into()),
        },
    }
}

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs.iter().copied().collect()
}

#[tokio::test]
async fn registration_creates_tenant_and_inactive_admin() {
    let (service, _) = setup().await;

    let (institute, admin) = service
        .register(register_input("11222333000181", "admin@example.com", "Lyceum"))
        .await
        .unwrap();

    assert_eq!(institute.cnpj, "11222333000181");
    assert_eq!(admin.profile, Profile::Institute);
    assert!(!admin.activation_status);

    let info = service.info(&admin).await.unwrap();
    assert_eq!(info.id, institute.id);
}

#[tokio::test]
async fn invalid_cnpj_is_rejected_up_front() {
    let (service, institutes) = setup().await;

    let err = service
        .register(register_input("11222333000180", "admin@example.com", "Lyceum"))
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::InvalidLegalId));

    let err = institutes.get_by_cnpj("11222333000180").await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_registrations_conflict() {
    let (service, _) = setup().await;
    service
        .register(register_input("11222333000181", "admin@example.com", "Lyceum"))
        .await
        .unwrap();

    let err = service
        .register(register_input("11222333000181", "other@example.com", "Other"))
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::AlreadyExists { entity: "institute" }));

    let err = service
        .register(register_input("11444777000161", "admin@example.com", "Other"))
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::AlreadyExists { entity: "user" }));
}

#[tokio::test]
async fn update_and_delete_are_scoped_to_the_actor() {
    let (service, institutes) = setup().await;
    let (institute, admin) = service
        .register(register_input("11222333000181", "admin@example.com", "Lyceum"))
        .await
        .unwrap();

    let updated = service
        .update(
            &admin,
            UpdateInstitute {
                trading_name: Some("Lyceum Prime".into()),
                address: Some(UpdateAddress {
                    city: Some("Olinda".into()),
                    ..UpdateAddress::default()
                }),
                ..UpdateInstitute::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, institute.id);
    assert_eq!(updated.trading_name, "Lyceum Prime");
    assert_eq!(updated.address.city, "Olinda");

    service.delete(&admin).await.unwrap();
    let err = institutes.get_by_id(institute.id).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
}

#[tokio::test]
async fn listing_filters_and_pages() {
    let (service, _) = setup().await;
    service
        .register(register_input("11222333000181", "a@example.com", "Alfa School"))
        .await
        .unwrap();
    service
        .register(register_input("11444777000161", "b@example.com", "Beta School"))
        .await
        .unwrap();

    let page = service
        .list(&params(&[("trading_name", "beta")]))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].trading_name, "Beta School");

    // Unrecognized parameters are ignored, not errors.
    let page = service
        .list(&params(&[("bogus", "x"), ("per_page", "10")]))
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    // Ordering outside the allow-list is a validation failure.
    let err = service
        .list(&params(&[("sort", "address")]))
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::InvalidOrderColumn(_)));

    // No matching rows is an empty page, which is a 404-class failure.
    let err = service
        .list(&params(&[("city", "Nowhere")]))
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::EmptyPage));
}
