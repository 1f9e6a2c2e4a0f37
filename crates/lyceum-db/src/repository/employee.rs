//! SurrealDB implementation of [`EmployeeRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use lyceum_core::error::LyceumResult;
use lyceum_core::models::employee::Employee;
use lyceum_core::models::user::{CreateUser, User};
use lyceum_core::query::{Filter, PageRequest, PageResult, SortClause};
use lyceum_core::repository::EmployeeRepository;

use crate::error::DbError;
use crate::query::{Scope, fetch_page};
use crate::repository::user::{UserRow, UserRowWithId};

/// Employee listings page over the linked users; the projection pulls
/// the user fields through the record link and aliases them so the
/// sort allow-list can address them directly.
const USER_PROJECTION: &str = "\
meta::id(user) AS record_id, \
user.email AS email, \
user.password_hash AS password_hash, \
user.name AS name, \
user.phone_number AS phone_number, \
user.token AS token, \
user.activation_status AS activation_status, \
user.profile AS profile, \
created_at";

#[derive(Debug, SurrealValue)]
struct EmployeeRowWithId {
    record_id: String,
    user_id: String,
    institute_id: String,
    role: Option<String>,
    created_at: DateTime<Utc>,
}

impl EmployeeRowWithId {
    fn try_into_employee(self) -> Result<Employee, DbError> {
        let parse = |s: &str| {
            Uuid::parse_str(s).map_err(|e| DbError::Query(format!("invalid UUID: {e}")))
        };
        Ok(Employee {
            id: parse(&self.record_id)?,
            user_id: parse(&self.user_id)?,
            institute_id: parse(&self.institute_id)?,
            role: self.role,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Employee repository.
#[derive(Clone)]
pub struct SurrealEmployeeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEmployeeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EmployeeRepository for SurrealEmployeeRepository<C> {
    async fn create_with_user(
        &self,
        user: CreateUser,
        institute_id: Uuid,
        role: Option<String>,
    ) -> LyceumResult<(User, Employee)> {
        let user_id = Uuid::new_v4();
        let employee_id = Uuid::new_v4();

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('user', $user_id) SET \
                 email = $email, \
                 password_hash = $password_hash, \
                 name = $name, \
                 phone_number = $phone_number, \
                 token = NONE, \
                 activation_status = false, \
                 profile = $profile; \
                 CREATE type::record('employee', $employee_id) SET \
                 user = type::record('user', $user_id), \
                 institute = type::record('institute', $institute_id), \
                 role = $role; \
                 COMMIT TRANSACTION;",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("email", user.email))
            .bind(("password_hash", user.password_hash))
            .bind(("name", user.name))
            .bind(("phone_number", user.phone_number))
            .bind(("profile", user.profile.as_str().to_string()))
            .bind(("employee_id", employee_id.to_string()))
            .bind(("institute_id", institute_id.to_string()))
            .bind(("role", role))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let user_id_str = user_id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let user = rows
            .into_iter()
            .next()
            .ok_or(DbError::NotFound {
                entity: "user",
                id: user_id_str,
            })?
            .into_user(user_id)?;

        let employee = self
            .find_by_user(user_id)
            .await?
            .ok_or(DbError::NotFound {
                entity: "employee",
                id: employee_id.to_string(),
            })?;

        Ok((user, employee))
    }

    async fn find_by_user(&self, user_id: Uuid) -> LyceumResult<Option<Employee>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, \
                 meta::id(user) AS user_id, \
                 meta::id(institute) AS institute_id, \
                 role, created_at \
                 FROM employee WHERE user = type::record('user', $user_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_employee()?)),
            None => Ok(None),
        }
    }

    async fn list_users(
        &self,
        institute_id: Uuid,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> LyceumResult<PageResult<User>> {
        let scope = Scope {
            fragment: "institute = type::record('institute', $scope)",
            bind_name: "scope",
            bind_value: institute_id.to_string(),
        };

        let rows: PageResult<UserRowWithId> = fetch_page(
            &self.db,
            "employee",
            USER_PROJECTION,
            Some(scope),
            &filters,
            &sort,
            page,
        )
        .await?;

        rows.try_map(|row| row.try_into_user().map_err(Into::into))
    }
}
