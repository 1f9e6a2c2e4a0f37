//! SurrealDB implementation of [`DocumentRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use lyceum_core::error::LyceumResult;
use lyceum_core::models::document::{CreateDocument, Document};
use lyceum_core::query::{Filter, PageRequest, PageResult, SortClause};
use lyceum_core::repository::DocumentRepository;

use crate::error::DbError;
use crate::query::{Scope, fetch_page};

const DOCUMENT_PROJECTION: &str = "\
meta::id(id) AS record_id, \
meta::id(student) AS student_id, \
title, key, created_at";

#[derive(Debug, SurrealValue)]
struct DocumentRowWithId {
    record_id: String,
    student_id: String,
    title: String,
    key: Option<String>,
    created_at: DateTime<Utc>,
}

impl DocumentRowWithId {
    fn try_into_document(self) -> Result<Document, DbError> {
        let parse = |s: &str| {
            Uuid::parse_str(s).map_err(|e| DbError::Query(format!("invalid UUID: {e}")))
        };
        Ok(Document {
            id: parse(&self.record_id)?,
            student_id: parse(&self.student_id)?,
            title: self.title,
            key: self.key,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Document repository.
#[derive(Clone)]
pub struct SurrealDocumentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDocumentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DocumentRepository for SurrealDocumentRepository<C> {
    async fn create(&self, input: CreateDocument) -> LyceumResult<Document> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('document', $id) SET \
                 student = type::record('student', $student_id), \
                 title = $title, \
                 key = $key \
                 RETURN meta::id(id) AS record_id, \
                 meta::id(student) AS student_id, \
                 title, key, created_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("student_id", input.student_id.to_string()))
            .bind(("title", input.title))
            .bind(("key", input.key))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "document",
            id: id_str,
        })?;

        Ok(row.try_into_document()?)
    }

    async fn find_by_student(&self, student_id: Uuid) -> LyceumResult<Option<Document>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {DOCUMENT_PROJECTION} FROM document \
                 WHERE student = type::record('student', $student_id)"
            ))
            .bind(("student_id", student_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DocumentRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_document()?)),
            None => Ok(None),
        }
    }

    async fn replace(&self, student_id: Uuid, input: CreateDocument) -> LyceumResult<Document> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE document WHERE student = type::record('student', $student_id); \
                 CREATE type::record('document', $id) SET \
                 student = type::record('student', $new_student_id), \
                 title = $title, \
                 key = $key; \
                 COMMIT TRANSACTION;",
            )
            .bind(("student_id", student_id.to_string()))
            .bind(("id", id.to_string()))
            .bind(("new_student_id", input.student_id.to_string()))
            .bind(("title", input.title))
            .bind(("key", input.key))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.find_by_student(input.student_id)
            .await?
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "document",
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn delete(&self, id: Uuid) -> LyceumResult<()> {
        self.db
            .query("DELETE type::record('document', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        institute_id: Uuid,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> LyceumResult<PageResult<Document>> {
        let scope = Scope {
            fragment: "student.institute = type::record('institute', $scope)",
            bind_name: "scope",
            bind_value: institute_id.to_string(),
        };

        let rows: PageResult<DocumentRowWithId> = fetch_page(
            &self.db,
            "document",
            DOCUMENT_PROJECTION,
            Some(scope),
            &filters,
            &sort,
            page,
        )
        .await?;

        rows.try_map(|row| row.try_into_document().map_err(Into::into))
    }
}
