//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use lyceum_core::error::LyceumResult;
use lyceum_core::models::user::{CreateUser, Profile, UpdateUser, User};
use lyceum_core::repository::UserRepository;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
pub(crate) struct UserRow {
    email: String,
    password_hash: Option<String>,
    name: String,
    phone_number: String,
    token: Option<String>,
    activation_status: bool,
    profile: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct UserRowWithId {
    record_id: String,
    email: String,
    password_hash: Option<String>,
    name: String,
    phone_number: String,
    token: Option<String>,
    activation_status: bool,
    profile: String,
    created_at: DateTime<Utc>,
}

pub(crate) fn parse_profile(s: &str) -> Result<Profile, DbError> {
    s.parse()
        .map_err(|_| DbError::Query(format!("unknown profile: {s}")))
}

impl UserRow {
    pub(crate) fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            phone_number: self.phone_number,
            token: self.token,
            activation_status: self.activation_status,
            profile: parse_profile(&self.profile)?,
            created_at: self.created_at,
        })
    }
}

impl UserRowWithId {
    pub(crate) fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Query(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            phone_number: self.phone_number,
            token: self.token,
            activation_status: self.activation_status,
            profile: parse_profile(&self.profile)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone, Debug)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> LyceumResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, \
                 password_hash = $password_hash, \
                 name = $name, \
                 phone_number = $phone_number, \
                 token = NONE, \
                 activation_status = false, \
                 profile = $profile",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("password_hash", input.password_hash))
            .bind(("name", input.name))
            .bind(("phone_number", input.phone_number))
            .bind(("profile", input.profile.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user",
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> LyceumResult<User> {
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

    async fn get_by_email(&self, email: &str) -> LyceumResult<User> {
        let email = email.to_owned();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user WHERE email = $email")
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user",
            id: email,
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> LyceumResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.phone_number.is_some() {
            sets.push("phone_number = $phone_number");
        }
        if input.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.token.is_some() {
            sets.push("token = $token_value");
        }
        if input.activation_status.is_some() {
            sets.push("activation_status = $activation_status");
        }

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(phone_number) = input.phone_number {
            builder = builder.bind(("phone_number", phone_number));
        }
        if let Some(password_hash) = input.password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(token) = input.token {
            // token is Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("token_value", token));
        }
        if let Some(activation_status) = input.activation_status {
            builder = builder.bind(("activation_status", activation_status));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user",
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn delete(&self, id: Uuid) -> LyceumResult<()> {
        // The user's specialization records go with it; a student's
        // document must go before the student row it links to.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE document WHERE student.user = type::record('user', $id); \
                 DELETE student WHERE user = type::record('user', $id); \
                 DELETE employee WHERE user = type::record('user', $id); \
                 DELETE type::record('user', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
