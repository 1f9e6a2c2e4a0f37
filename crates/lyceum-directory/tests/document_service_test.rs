//! Integration tests for document management, including the
//! compensated update path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDate;
use lyceum_auth::mail::LogMailer;
use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::external::BlobStore;
use lyceum_core::models::address::Address;
use lyceum_core::models::document::{CreateDocument, Document};
use lyceum_core::models::institute::CreateInstitute;
use lyceum_core::models::student::{CreateStudent, Gender};
use lyceum_core::models::user::{CreateUser, Profile, User};
use lyceum_core::query::{Filter, PageRequest, PageResult, QueryParams, SortClause};
use lyceum_core::repository::{DocumentRepository, InstituteRepository, StudentRepository};
use lyceum_db::repository::{
    SurrealDocumentRepository, SurrealEmployeeRepository, SurrealInstituteRepository,
    SurrealStudentRepository,
};
use lyceum_directory::DocumentService;
use lyceum_directory::blob::MemoryBlobStore;
use lyceum_directory::document::{DocumentFile, DocumentInput};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    lyceum_db::run_migrations(&db).await.unwrap();
    db
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

/// Create a tenant with one enrolled student; returns the student's
/// identity and the admin's.
async fn seed(db: &Surreal<Db>) -> (User, User) {
    let institutes = SurrealInstituteRepository::new(db.clone());
    let (institute, admin) = institutes
        .create_with_admin(
            CreateInstitute {
                cnpj: "11222333000181".into(),
                trading_name: "Lyceum".into(),
                corporate_name: "Lyceum LTDA".into(),
                address: address(),
            },
            CreateUser {
                email: "admin@example.com".into(),
                name: "Admin".into(),
                phone_number: "81987654321".into(),
                profile: Profile::Institute,
                password_hash: None,
            },
            None,
        )
        .await
        .unwrap();

    let students = SurrealStudentRepository::new(db.clone());
    let (user, _) = students
        .create_with_user(
            CreateUser {
                email: "pupil@example.com".into(),
                name: "Pupil".into(),
                phone_number: "81987654321".into(),
                profile: Profile::Student,
                password_hash: None,
            },
            institute.id,
            CreateStudent {
                birthday_date: NaiveDate::from_ymd_opt(2004, 5, 17).unwrap(),
                gender: Gender::Unspoken,
                disabled_person: false,
                address: address(),
            },
        )
        .await
        .unwrap();

    (user, admin)
}

fn service_with<B: BlobStore, D: DocumentRepository>(
    db: &Surreal<Db>,
    documents: D,
    blobs: B,
) -> DocumentService<D, SurrealStudentRepository<Db>, SurrealEmployeeRepository<Db>, B, LogMailer>
{
    DocumentService::new(
        documents,
        SurrealStudentRepository::new(db.clone()),
        SurrealEmployeeRepository::new(db.clone()),
        blobs,
        LogMailer,
    )
}

fn pdf(bytes: &[u8]) -> Option<DocumentFile> {
    Some(DocumentFile {
        filename: "transcript.pdf".into(),
        bytes: bytes.to_vec(),
    })
}

fn title(text: &str) -> DocumentInput {
    DocumentInput { title: text.into() }
}

#[tokio::test]
async fn create_uploads_under_the_student_key() {
    let db = setup_db().await;
    let (student_user, _) = seed(&db).await;
    let blobs = MemoryBlobStore::new();
    let service = service_with(&db, SurrealDocumentRepository::new(db.clone()), blobs.clone());

    let document = service
        .create(&student_user, title("Transcript"), pdf(b"original"))
        .await
        .unwrap();
    let key = document.key.clone().unwrap();
    assert!(key.ends_with(".pdf"));
    assert!(blobs.contains(&key));

    let fetched = service.get(&student_user).await.unwrap();
    assert_eq!(fetched.id, document.id);
    assert_eq!(service.download(&student_user).await.unwrap(), b"original");

    // At most one document per student.
    let err = service
        .create(&student_user, title("Another"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::AlreadyExists { entity: "document" }));
}

#[tokio::test]
async fn create_validates_title_and_extension() {
    let db = setup_db().await;
    let (student_user, _) = seed(&db).await;
    let service = service_with(
        &db,
        SurrealDocumentRepository::new(db.clone()),
        MemoryBlobStore::new(),
    );

    let err = service
        .create(&student_user, title(&"x".repeat(101)), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::Validation { field: "title", .. }));

    let err = service
        .create(
            &student_user,
            title("Transcript"),
            Some(DocumentFile {
                filename: "malware.exe".into(),
                bytes: b"nope".to_vec(),
            }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::UnsupportedFile));
}

#[tokio::test]
async fn update_swaps_row_and_file() {
    let db = setup_db().await;
    let (student_user, _) = seed(&db).await;
    let blobs = MemoryBlobStore::new();
    let service = service_with(&db, SurrealDocumentRepository::new(db.clone()), blobs.clone());

    service
        .create(&student_user, title("Transcript"), pdf(b"original"))
        .await
        .unwrap();
    let updated = service
        .update(&student_user, title("Transcript v2"), pdf(b"replacement"))
        .await
        .unwrap();

    assert_eq!(updated.title, "Transcript v2");
    assert_eq!(
        service.download(&student_user).await.unwrap(),
        b"replacement"
    );
}

#[tokio::test]
async fn delete_removes_row_and_file() {
    let db = setup_db().await;
    let (student_user, _) = seed(&db).await;
    let blobs = MemoryBlobStore::new();
    let service = service_with(&db, SurrealDocumentRepository::new(db.clone()), blobs.clone());

    let document = service
        .create(&student_user, title("Transcript"), pdf(b"original"))
        .await
        .unwrap();
    let key = document.key.unwrap();

    service.delete(&student_user).await.unwrap();
    assert!(!blobs.contains(&key));
    let err = service.get(&student_user).await.unwrap_err();
    assert!(matches!(err, LyceumError::NotFound { .. }));
}

#[tokio::test]
async fn delete_fails_distinctly_when_the_file_is_already_gone() {
    let db = setup_db().await;
    let (student_user, _) = seed(&db).await;
    let blobs = MemoryBlobStore::new();
    let service = service_with(&db, SurrealDocumentRepository::new(db.clone()), blobs.clone());

    let document = service
        .create(&student_user, title("Transcript"), pdf(b"original"))
        .await
        .unwrap();
    blobs.delete(&document.key.unwrap()).await.unwrap();

    let err = service.delete(&student_user).await.unwrap_err();
    assert!(matches!(err, LyceumError::BlobMissing { .. }));
}

// ---------------------------------------------------------------------
// Compensation path
// ---------------------------------------------------------------------

/// Delegates to the real repository but fails every `replace`.
#[derive(Clone)]
struct FailingReplaceRepo {
    inner: SurrealDocumentRepository<Db>,
}

impl DocumentRepository for FailingReplaceRepo {
    async fn create(&self, input: CreateDocument) -> LyceumResult<Document> {
        self.inner.create(input).await
    }

    async fn find_by_student(&self, student_id: Uuid) -> LyceumResult<Option<Document>> {
        self.inner.find_by_student(student_id).await
    }

    async fn replace(&self, _: Uuid, _: CreateDocument) -> LyceumResult<Document> {
        Err(LyceumError::Database("simulated swap failure".into()))
    }

    async fn delete(&self, id: Uuid) -> LyceumResult<()> {
        self.inner.delete(id).await
    }

    async fn list(
        &self,
        institute_id: Uuid,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> LyceumResult<PageResult<Document>> {
        self.inner.list(institute_id, filters, sort, page).await
    }
}

/// Delegates to the real store but fails `put` after a budget of
/// successful calls.
#[derive(Clone)]
struct FlakyBlobStore {
    inner: MemoryBlobStore,
    puts_left: Arc<AtomicU32>,
}

impl FlakyBlobStore {
    fn failing_after(inner: MemoryBlobStore, successful_puts: u32) -> Self {
        Self {
            inner,
            puts_left: Arc::new(AtomicU32::new(successful_puts)),
        }
    }
}

impl BlobStore for FlakyBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> LyceumResult<String> {
        let left = self.puts_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(LyceumError::Database("simulated storage outage".into()));
        }
        self.puts_left.store(left - 1, Ordering::SeqCst);
        self.inner.put(key, bytes).await
    }

    async fn get(&self, key: &str) -> LyceumResult<Vec<u8>> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> LyceumResult<()> {
        self.inner.delete(key).await
    }
}

#[tokio::test]
async fn failed_swap_restores_the_original_file() {
    let db = setup_db().await;
    let (student_user, _) = seed(&db).await;
    let blobs = MemoryBlobStore::new();

    // Seed through the real repository, then update through one whose
    // swap always fails.
    let real = service_with(&db, SurrealDocumentRepository::new(db.clone()), blobs.clone());
    let document = real
        .create(&student_user, title("Transcript"), pdf(b"original"))
        .await
        .unwrap();
    let key = document.key.unwrap();

    let failing = service_with(
        &db,
        FailingReplaceRepo {
            inner: SurrealDocumentRepository::new(db.clone()),
        },
        blobs.clone(),
    );
    let err = failing
        .update(&student_user, title("Transcript v2"), pdf(b"replacement"))
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::DocumentUpdateFailed(_)), "{err:?}");

    // The overwrite was compensated and the row untouched.
    assert_eq!(blobs.get(&key).await.unwrap(), b"original");
    let current = real.get(&student_user).await.unwrap();
    assert_eq!(current.title, "Transcript");
}

#[tokio::test]
async fn failed_restore_is_an_elevated_failure() {
    let db = setup_db().await;
    let (student_user, _) = seed(&db).await;
    let blobs = MemoryBlobStore::new();

    let real = service_with(&db, SurrealDocumentRepository::new(db.clone()), blobs.clone());
    real.create(&student_user, title("Transcript"), pdf(b"original"))
        .await
        .unwrap();

    // One put succeeds (the new upload), the restore put fails.
    let failing = service_with(
        &db,
        FailingReplaceRepo {
            inner: SurrealDocumentRepository::new(db.clone()),
        },
        FlakyBlobStore::failing_after(blobs.clone(), 1),
    );
    let err = failing
        .update(&student_user, title("Transcript v2"), pdf(b"replacement"))
        .await
        .unwrap_err();
    assert!(matches!(err, LyceumError::DocumentRestoreFailed(_)), "{err:?}");
}

#[tokio::test]
async fn listing_is_scoped_and_filterable_by_title() {
    let db = setup_db().await;
    let (student_user, admin) = seed(&db).await;
    let blobs = MemoryBlobStore::new();
    let service = service_with(&db, SurrealDocumentRepository::new(db.clone()), blobs);

    service
        .create(&student_user, title("Enrollment Form"), None)
        .await
        .unwrap();

    let params: QueryParams = [("title", "enroll")].into_iter().collect();
    let page = service.list(&admin, &params).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Enrollment Form");

    let params: QueryParams = [("title", "nothing")].into_iter().collect();
    let err = service.list(&admin, &params).await.unwrap_err();
    assert!(matches!(err, LyceumError::EmptyPage));
}
