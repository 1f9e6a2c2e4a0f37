//! Document management for students, including the compensated update
//! path around the blob store.

use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use lyceum_auth::mail::{self, send_detached};
use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::external::{BlobStore, Mailer, OutgoingMail};
use lyceum_core::models::document::{CreateDocument, Document};
use lyceum_core::models::employee::Employee;
use lyceum_core::models::student::Student;
use lyceum_core::models::user::User;
use lyceum_core::query::{
    DOCUMENT_FILTERS, DOCUMENT_SORTABLE, PageRequest, PageResult, QueryParams, build_filters,
    parse_sort,
};
use lyceum_core::repository::{DocumentRepository, EmployeeRepository, StudentRepository};

const MAX_TITLE_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInput {
    pub title: String,
}

/// An uploaded file as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

fn file_key(student_id: Uuid) -> String {
    format!("{student_id}.pdf")
}

fn check_extension(filename: &str) -> LyceumResult<()> {
    let allowed = filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"));
    if allowed {
        Ok(())
    } else {
        Err(LyceumError::UnsupportedFile)
    }
}

fn check_title(title: &str) -> LyceumResult<()> {
    if title.is_empty() {
        return Err(LyceumError::Validation {
            field: "title",
            message: "title is required".into(),
        });
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(LyceumError::Validation {
            field: "title",
            message: format!(
                "title is too long ({} characters, {MAX_TITLE_LEN} is the limit)",
                title.len()
            ),
        });
    }
    Ok(())
}

pub struct DocumentService<D, S, E, B, M>
where
    D: DocumentRepository,
    S: StudentRepository,
    E: EmployeeRepository,
    B: BlobStore,
    M: Mailer + Clone,
{
    documents: D,
    students: S,
    employees: E,
    blobs: B,
    mailer: M,
}

impl<D, S, E, B, M> DocumentService<D, S, E, B, M>
where
    D: DocumentRepository,
    S: StudentRepository,
    E: EmployeeRepository,
    B: BlobStore,
    M: Mailer + Clone,
{
    pub fn new(documents: D, students: S, employees: E, blobs: B, mailer: M) -> Self {
        Self {
            documents,
            students,
            employees,
            blobs,
            mailer,
        }
    }

    /// Create the acting student's document, optionally uploading its
    /// file. A second document is a conflict.
    pub async fn create(
        &self,
        actor: &User,
        input: DocumentInput,
        file: Option<DocumentFile>,
    ) -> LyceumResult<Document> {
        let student = self.student_of(actor).await?;

        if self.documents.find_by_student(student.id).await?.is_some() {
            return Err(LyceumError::AlreadyExists { entity: "document" });
        }
        check_title(&input.title)?;

        let key = match file {
            Some(file) => {
                check_extension(&file.filename)?;
                Some(self.blobs.put(&file_key(student.id), file.bytes).await?)
            }
            None => None,
        };

        let document = self
            .documents
            .create(CreateDocument {
                student_id: student.id,
                title: input.title,
                key,
            })
            .await?;

        send_detached(
            &self.mailer,
            OutgoingMail::new(
                actor.email.clone(),
                mail::DOCUMENT_UPLOADED,
                "Document Upload Successfully",
            ),
        );

        Ok(document)
    }

    /// The acting student's document.
    pub async fn get(&self, actor: &User) -> LyceumResult<Document> {
        let student = self.student_of(actor).await?;
        self.documents
            .find_by_student(student.id)
            .await?
            .ok_or(LyceumError::NotFound {
                entity: "document",
                id: student.id.to_string(),
            })
    }

    /// Download the acting student's document file.
    pub async fn download(&self, actor: &User) -> LyceumResult<Vec<u8>> {
        let document = self.get(actor).await?;
        let key = document.key.ok_or(LyceumError::BlobMissing {
            key: file_key(document.student_id),
        })?;
        self.blobs.get(&key).await
    }

    /// Replace the acting student's document and, when a new file is
    /// supplied, its stored file.
    ///
    /// The remote overwrite happens first; if the local swap then
    /// fails, the previous file content is restored best-effort. A
    /// failed restoration surfaces as `DocumentRestoreFailed` instead
    /// of masking the original error — the file must never be lost
    /// silently.
    pub async fn update(
        &self,
        actor: &User,
        input: DocumentInput,
        file: Option<DocumentFile>,
    ) -> LyceumResult<Document> {
        let student = self.student_of(actor).await?;
        let current = self
            .documents
            .find_by_student(student.id)
            .await?
            .ok_or(LyceumError::NotFound {
                entity: "document",
                id: student.id.to_string(),
            })?;
        check_title(&input.title)?;

        // Snapshot the current file before anything is overwritten.
        let old_bytes = match &current.key {
            Some(key) => Some(self.blobs.get(key).await?),
            None => None,
        };

        let key = file_key(student.id);
        let uploaded = match &file {
            Some(file) => {
                check_extension(&file.filename)?;
                self.blobs
                    .put(&key, file.bytes.clone())
                    .await
                    .map_err(|e| LyceumError::DocumentUpdateFailed(e.to_string()))?;
                true
            }
            None => false,
        };

        let replaced = self
            .documents
            .replace(
                student.id,
                CreateDocument {
                    student_id: student.id,
                    title: input.title,
                    key: if uploaded {
                        Some(key.clone())
                    } else {
                        current.key.clone()
                    },
                },
            )
            .await;

        match replaced {
            Ok(document) => Ok(document),
            Err(swap_err) => {
                if uploaded {
                    if let Some(bytes) = old_bytes {
                        if let Err(restore_err) = self.blobs.put(&key, bytes).await {
                            error!(
                                %key,
                                error = %restore_err,
                                "document rollback could not restore the original file"
                            );
                            return Err(LyceumError::DocumentRestoreFailed(format!(
                                "{swap_err}; additionally: {restore_err}"
                            )));
                        }
                    }
                }
                Err(LyceumError::DocumentUpdateFailed(swap_err.to_string()))
            }
        }
    }

    /// Delete the acting student's document and its stored file.
    pub async fn delete(&self, actor: &User) -> LyceumResult<()> {
        let document = self.get(actor).await?;
        if let Some(key) = &document.key {
            // Fails distinctly when the file is already gone.
            self.blobs.get(key).await?;
            self.blobs.delete(key).await?;
        }
        self.documents.delete(document.id).await
    }

    /// Page over the documents of the actor's institute.
    pub async fn list(
        &self,
        actor: &User,
        params: &QueryParams,
    ) -> LyceumResult<PageResult<Document>> {
        let employee = self.employee_of(actor).await?;
        let filters = build_filters(DOCUMENT_FILTERS, params);
        let sort = parse_sort(params, DOCUMENT_SORTABLE)?;
        let page = PageRequest::from_params(params);
        self.documents
            .list(employee.institute_id, filters, sort, page)
            .await
    }

    async fn student_of(&self, actor: &User) -> LyceumResult<Student> {
        self.students
            .find_by_user(actor.id)
            .await?
            .ok_or(LyceumError::NotFound {
                entity: "student",
                id: actor.id.to_string(),
            })
    }

    async fn employee_of(&self, actor: &User) -> LyceumResult<Employee> {
        self.employees
            .find_by_user(actor.id)
            .await?
            .ok_or(LyceumError::NotFound {
                entity: "employee",
                id: actor.id.to_string(),
            })
    }
}
