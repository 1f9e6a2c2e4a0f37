//! SurrealDB implementation of [`InstituteRepository`].
//!
//! Institute creation and deletion are the two compound mutations of
//! the system: both run as a single transaction so that no partial
//! tenant ever becomes visible.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use lyceum_core::error::LyceumResult;
use lyceum_core::models::address::Address;
use lyceum_core::models::institute::{CreateInstitute, Institute, UpdateInstitute};
use lyceum_core::models::user::{CreateUser, User};
use lyceum_core::query::{Filter, PageRequest, PageResult, SortClause};
use lyceum_core::repository::InstituteRepository;

use crate::error::DbError;
use crate::query::fetch_page;
use crate::repository::user::UserRow;

#[derive(Debug, SurrealValue)]
struct InstituteRow {
    cnpj: String,
    trading_name: String,
    corporate_name: String,
    address: serde_json::Value,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct InstituteRowWithId {
    record_id: String,
    cnpj: String,
    trading_name: String,
    corporate_name: String,
    address: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn parse_address(value: serde_json::Value) -> Result<Address, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::Query(format!("invalid address: {e}")))
}

impl InstituteRow {
    fn into_institute(self, id: Uuid) -> Result<Institute, DbError> {
        Ok(Institute {
            id,
            cnpj: self.cnpj,
            trading_name: self.trading_name,
            corporate_name: self.corporate_name,
            address: parse_address(self.address)?,
            created_at: self.created_at,
        })
    }
}

impl InstituteRowWithId {
    fn try_into_institute(self) -> Result<Institute, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(Institute {
            id,
            cnpj: self.cnpj,
            trading_name: self.trading_name,
            corporate_name: self.corporate_name,
            address: parse_address(self.address)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Institute repository.
#[derive(Clone)]
pub struct SurrealInstituteRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInstituteRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_user(&self, id: Uuid) -> LyceumResult<User> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user",
            id: id_str,
        })?;
        Ok(row.into_user(id)?)
    }
}

impl<C: Connection> InstituteRepository for SurrealInstituteRepository<C> {
    async fn create_with_admin(
        &self,
        institute: CreateInstitute,
        admin: CreateUser,
        role: Option<String>,
    ) -> LyceumResult<(Institute, User)> {
        let institute_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let employee_id = Uuid::new_v4();

        let address = serde_json::to_value(&institute.address)
            .map_err(|e| DbError::Query(format!("invalid address: {e}")))?;

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('institute', $institute_id) SET \
                 cnpj = $cnpj, \
                 trading_name = $trading_name, \
                 corporate_name = $corporate_name, \
                 address = $address; \
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
            .bind(("institute_id", institute_id.to_string()))
            .bind(("cnpj", institute.cnpj))
            .bind(("trading_name", institute.trading_name))
            .bind(("corporate_name", institute.corporate_name))
            .bind(("address", address))
            .bind(("user_id", user_id.to_string()))
            .bind(("email", admin.email))
            .bind(("password_hash", admin.password_hash))
            .bind(("name", admin.name))
            .bind(("phone_number", admin.phone_number))
            .bind(("profile", admin.profile.as_str().to_string()))
            .bind(("employee_id", employee_id.to_string()))
            .bind(("role", role))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let institute = self.get_by_id(institute_id).await?;
        let user = self.fetch_user(user_id).await?;
        Ok((institute, user))
    }

    async fn get_by_id(&self, id: Uuid) -> LyceumResult<Institute> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('institute', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InstituteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "institute",
            id: id_str,
        })?;

        Ok(row.into_institute(id)?)
    }

    async fn get_by_cnpj(&self, cnpj: &str) -> LyceumResult<Institute> {
        let cnpj = cnpj.to_owned();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM institute WHERE cnpj = $cnpj")
            .bind(("cnpj", cnpj.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InstituteRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "institute",
            id: cnpj,
        })?;

        Ok(row.try_into_institute()?)
    }

    async fn update(&self, id: Uuid, input: UpdateInstitute) -> LyceumResult<Institute> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.trading_name.is_some() {
            sets.push("trading_name = $trading_name");
        }
        if input.corporate_name.is_some() {
            sets.push("corporate_name = $corporate_name");
        }

        // A partial address update is applied against the stored value.
        let address = match input.address {
            Some(update) => {
                let mut current = self.get_by_id(id).await?.address;
                current.apply(update);
                sets.push("address = $address");
                Some(
                    serde_json::to_value(&current)
                        .map_err(|e| DbError::Query(format!("invalid address: {e}")))?,
                )
            }
            None => None,
        };

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE type::record('institute', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(trading_name) = input.trading_name {
            builder = builder.bind(("trading_name", trading_name));
        }
        if let Some(corporate_name) = input.corporate_name {
            builder = builder.bind(("corporate_name", corporate_name));
        }
        if let Some(address) = address {
            builder = builder.bind(("address", address));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<InstituteRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "institute",
            id: id_str,
        })?;

        Ok(row.into_institute(id)?)
    }

    async fn delete(&self, id: Uuid) -> LyceumResult<()> {
        // Documents first (they traverse the student link), then the
        // owned users while the association rows still exist, then the
        // associations, then the tenant itself.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE document WHERE student.institute = type::record('institute', $id); \
                 DELETE user WHERE meta::id(id) IN \
                 (SELECT VALUE meta::id(user) FROM employee \
                  WHERE institute = type::record('institute', $id)); \
                 DELETE user WHERE meta::id(id) IN \
                 (SELECT VALUE meta::id(user) FROM student \
                  WHERE institute = type::record('institute', $id)); \
                 DELETE employee WHERE institute = type::record('institute', $id); \
                 DELETE student WHERE institute = type::record('institute', $id); \
                 DELETE type::record('institute', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> LyceumResult<PageResult<Institute>> {
        let rows: PageResult<InstituteRowWithId> = fetch_page(
            &self.db,
            "institute",
            "meta::id(id) AS record_id, *",
            None,
            &filters,
            &sort,
            page,
        )
        .await?;

        rows.try_map(|row| row.try_into_institute().map_err(Into::into))
    }
}
