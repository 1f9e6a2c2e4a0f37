//! SurrealDB repository implementations for the `lyceum-core` traits.

mod document;
mod employee;
mod institute;
mod student;
mod user;

pub use document::SurrealDocumentRepository;
pub use employee::SurrealEmployeeRepository;
pub use institute::SurrealInstituteRepository;
pub use student::SurrealStudentRepository;
pub use user::SurrealUserRepository;
