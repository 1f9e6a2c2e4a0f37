//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Listing operations take the
//! predicate and ordering descriptions produced by [`crate::query`] and
//! return one page of results; compound creations and deletions are
//! atomic — a failure after partial writes must leave no trace.

use uuid::Uuid;

use crate::error::LyceumResult;
use crate::models::{
    document::{CreateDocument, Document},
    employee::Employee,
    institute::{CreateInstitute, Institute, UpdateInstitute},
    student::{CreateStudent, Student, UpdateStudent},
    user::{CreateUser, UpdateUser, User},
};
use crate::query::{Filter, PageRequest, PageResult, SortClause};

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = LyceumResult<User>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = LyceumResult<User>> + Send;

    fn get_by_email(&self, email: &str) -> impl Future<Output = LyceumResult<User>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = LyceumResult<User>> + Send;

    /// Hard delete, cascading the user's employee or student record
    /// (and a student's document) in the same transaction.
    fn delete(&self, id: Uuid) -> impl Future<Output = LyceumResult<()>> + Send;
}

pub trait InstituteRepository: Send + Sync {
    /// Create the institute, its admin user and the binding employee
    /// record in one transaction.
    fn create_with_admin(
        &self,
        institute: CreateInstitute,
        admin: CreateUser,
        role: Option<String>,
    ) -> impl Future<Output = LyceumResult<(Institute, User)>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = LyceumResult<Institute>> + Send;

    fn get_by_cnpj(&self, cnpj: &str) -> impl Future<Output = LyceumResult<Institute>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateInstitute,
    ) -> impl Future<Output = LyceumResult<Institute>> + Send;

    /// Delete the institute and everything it owns: employees and
    /// students together with their users, addresses and documents.
    fn delete(&self, id: Uuid) -> impl Future<Output = LyceumResult<()>> + Send;

    fn list(
        &self,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> impl Future<Output = LyceumResult<PageResult<Institute>>> + Send;
}

pub trait EmployeeRepository: Send + Sync {
    /// Create the user and its employee association in one transaction.
    fn create_with_user(
        &self,
        user: CreateUser,
        institute_id: Uuid,
        role: Option<String>,
    ) -> impl Future<Output = LyceumResult<(User, Employee)>> + Send;

    fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = LyceumResult<Option<Employee>>> + Send;

    /// Page over the users employed by `institute_id`.
    fn list_users(
        &self,
        institute_id: Uuid,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> impl Future<Output = LyceumResult<PageResult<User>>> + Send;
}

pub trait StudentRepository: Send + Sync {
    /// Create the user and its student record in one transaction.
    fn create_with_user(
        &self,
        user: CreateUser,
        institute_id: Uuid,
        student: CreateStudent,
    ) -> impl Future<Output = LyceumResult<(User, Student)>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = LyceumResult<Student>> + Send;

    fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = LyceumResult<Option<Student>>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateStudent,
    ) -> impl Future<Output = LyceumResult<Student>> + Send;

    /// Delete the student record and its document; the user survives.
    fn delete(&self, id: Uuid) -> impl Future<Output = LyceumResult<()>> + Send;

    fn list(
        &self,
        institute_id: Uuid,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> impl Future<Output = LyceumResult<PageResult<Student>>> + Send;
}

pub trait DocumentRepository: Send + Sync {
    fn create(&self, input: CreateDocument) -> impl Future<Output = LyceumResult<Document>> + Send;

    fn find_by_student(
        &self,
        student_id: Uuid,
    ) -> impl Future<Output = LyceumResult<Option<Document>>> + Send;

    /// Swap the student's document for a new one in one transaction.
    fn replace(
        &self,
        student_id: Uuid,
        input: CreateDocument,
    ) -> impl Future<Output = LyceumResult<Document>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = LyceumResult<()>> + Send;

    /// Page over the documents of `institute_id`'s students.
    fn list(
        &self,
        institute_id: Uuid,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> impl Future<Output = LyceumResult<PageResult<Document>>> + Send;
}
