//! SurrealDB implementation of [`StudentRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use lyceum_core::error::LyceumResult;
use lyceum_core::models::address::Address;
use lyceum_core::models::student::{CreateStudent, Gender, Student, UpdateStudent};
use lyceum_core::models::user::{CreateUser, User};
use lyceum_core::query::{Filter, PageRequest, PageResult, SortClause};
use lyceum_core::repository::StudentRepository;

use crate::error::DbError;
use crate::query::{Scope, fetch_page};
use crate::repository::user::UserRow;

const STUDENT_PROJECTION: &str = "\
meta::id(id) AS record_id, \
meta::id(user) AS user_id, \
meta::id(institute) AS institute_id, \
birthday_date, gender, disabled_person, address, created_at";

/// Listing projection additionally pulls the user's name through the
/// record link so the sort allow-list can order by it.
const STUDENT_LIST_PROJECTION: &str = "\
meta::id(id) AS record_id, \
meta::id(user) AS user_id, \
meta::id(institute) AS institute_id, \
birthday_date, gender, disabled_person, address, created_at, \
user.name AS name";

#[derive(Debug, SurrealValue)]
struct StudentRowWithId {
    record_id: String,
    user_id: String,
    institute_id: String,
    birthday_date: String,
    gender: String,
    disabled_person: bool,
    address: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl StudentRowWithId {
    fn try_into_student(self) -> Result<Student, DbError> {
        let parse_uuid = |s: &str| {
            Uuid::parse_str(s).map_err(|e| DbError::Query(format!("invalid UUID: {e}")))
        };
        let birthday_date: NaiveDate = self
            .birthday_date
            .parse()
            .map_err(|e| DbError::Query(format!("invalid birthday date: {e}")))?;
        let gender: Gender = self
            .gender
            .parse()
            .map_err(|_| DbError::Query(format!("unknown gender: {}", self.gender)))?;
        let address: Address = serde_json::from_value(self.address)
            .map_err(|e| DbError::Query(format!("invalid address: {e}")))?;

        Ok(Student {
            id: parse_uuid(&self.record_id)?,
            user_id: parse_uuid(&self.user_id)?,
            institute_id: parse_uuid(&self.institute_id)?,
            birthday_date,
            gender,
            disabled_person: self.disabled_person,
            address,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Student repository.
#[derive(Clone)]
pub struct SurrealStudentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStudentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> StudentRepository for SurrealStudentRepository<C> {
    async fn create_with_user(
        &self,
        user: CreateUser,
        institute_id: Uuid,
        student: CreateStudent,
    ) -> LyceumResult<(User, Student)> {
        let user_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();

        let address = serde_json::to_value(&student.address)
            .map_err(|e| DbError::Query(format!("invalid address: {e}")))?;

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
                 CREATE type::record('student', $student_id) SET \
                 user = type::record('user', $user_id), \
                 institute = type::record('institute', $institute_id), \
                 birthday_date = $birthday_date, \
                 gender = $gender, \
                 disabled_person = $disabled_person, \
                 address = $address; \
                 COMMIT TRANSACTION;",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("email", user.email))
            .bind(("password_hash", user.password_hash))
            .bind(("name", user.name))
            .bind(("phone_number", user.phone_number))
            .bind(("profile", user.profile.as_str().to_string()))
            .bind(("student_id", student_id.to_string()))
            .bind(("institute_id", institute_id.to_string()))
            .bind(("birthday_date", student.birthday_date.to_string()))
            .bind(("gender", student.gender.as_str().to_string()))
            .bind(("disabled_person", student.disabled_person))
            .bind(("address", address))
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

        let student = self.get_by_id(student_id).await?;
        Ok((user, student))
    }

    async fn get_by_id(&self, id: Uuid) -> LyceumResult<Student> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {STUDENT_PROJECTION} FROM type::record('student', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "student",
            id: id_str,
        })?;

        Ok(row.try_into_student()?)
    }

    async fn find_by_user(&self, user_id: Uuid) -> LyceumResult<Option<Student>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {STUDENT_PROJECTION} FROM student \
                 WHERE user = type::record('user', $user_id)"
            ))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_student()?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, input: UpdateStudent) -> LyceumResult<Student> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.birthday_date.is_some() {
            sets.push("birthday_date = $birthday_date");
        }
        if input.gender.is_some() {
            sets.push("gender = $gender");
        }
        if input.disabled_person.is_some() {
            sets.push("disabled_person = $disabled_person");
        }

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
            "UPDATE type::record('student', $id) SET {} \
             RETURN {STUDENT_PROJECTION}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(birthday_date) = input.birthday_date {
            builder = builder.bind(("birthday_date", birthday_date.to_string()));
        }
        if let Some(gender) = input.gender {
            builder = builder.bind(("gender", gender.as_str().to_string()));
        }
        if let Some(disabled_person) = input.disabled_person {
            builder = builder.bind(("disabled_person", disabled_person));
        }
        if let Some(address) = address {
            builder = builder.bind(("address", address));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<StudentRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "student",
            id: id_str,
        })?;

        Ok(row.try_into_student()?)
    }

    async fn delete(&self, id: Uuid) -> LyceumResult<()> {
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE document WHERE student = type::record('student', $id); \
                 DELETE type::record('student', $id); \
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
        institute_id: Uuid,
        filters: Vec<Filter>,
        sort: Vec<SortClause>,
        page: PageRequest,
    ) -> LyceumResult<PageResult<Student>> {
        let scope = Scope {
            fragment: "institute = type::record('institute', $scope)",
            bind_name: "scope",
            bind_value: institute_id.to_string(),
        };

        let rows: PageResult<StudentRowWithId> = fetch_page(
            &self.db,
            "student",
            STUDENT_LIST_PROJECTION,
            Some(scope),
            &filters,
            &sort,
            page,
        )
        .await?;

        rows.try_map(|row| row.try_into_student().map_err(Into::into))
    }
}
