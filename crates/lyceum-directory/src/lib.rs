//! Lyceum Directory — the resource services. Each service composes
//! the access-control guard output (a resolved identity), the tenant
//! scoping rules and the paginated query layer; none of them
//! re-implements an authorization check or query construction.

pub mod blob;
pub mod document;
pub mod employee;
pub mod institute;
pub mod student;
pub mod user;

pub use document::DocumentService;
pub use employee::EmployeeService;
pub use institute::InstituteService;
pub use student::StudentService;
pub use user::UserService;
