//! Student invitation, registration and institute-scoped access.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use lyceum_auth::config::AuthConfig;
use lyceum_auth::mail::{self, send_detached};
use lyceum_auth::token;
use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::external::{Mailer, OutgoingMail};
use lyceum_core::models::address::Address;
use lyceum_core::models::employee::Employee;
use lyceum_core::models::student::{CreateStudent, Gender, Student, UpdateStudent};
use lyceum_core::models::user::{CreateUser, Profile, UpdateUser, User};
use lyceum_core::query::{
    PageRequest, PageResult, QueryParams, STUDENT_FILTERS, STUDENT_SORTABLE, build_filters,
    parse_sort,
};
use lyceum_core::repository::{EmployeeRepository, StudentRepository, UserRepository};
use lyceum_core::scope::{ActorContext, check_student_access};
use lyceum_core::validate;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterStudent {
    pub name: String,
    pub phone_number: String,
    /// ISO `YYYY-MM-DD`.
    pub birthday_date: String,
    pub gender: Gender,
    pub disabled_person: bool,
    pub address: Address,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudentProfile {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    #[serde(flatten)]
    pub student: UpdateStudent,
}

pub struct StudentService<S, E, U, M>
where
    S: StudentRepository,
    E: EmployeeRepository,
    U: UserRepository,
    M: Mailer + Clone,
{
    students: S,
    employees: E,
    users: U,
    mailer: M,
    config: AuthConfig,
}

impl<S, E, U, M> StudentService<S, E, U, M>
where
    S: StudentRepository,
    E: EmployeeRepository,
    U: UserRepository,
    M: Mailer + Clone,
{
    pub fn new(students: S, employees: E, users: U, mailer: M, config: AuthConfig) -> Self {
        Self {
            students,
            employees,
            users,
            mailer,
            config,
        }
    }

    /// Invite a student by email. Writes nothing: the invitation token
    /// carries the student/inviter address pair, and the student record
    /// is created only when the invitee registers.
    pub async fn invite(&self, actor: &User, email: &str) -> LyceumResult<()> {
        validate::email(email)?;

        match self.users.get_by_email(email).await {
            Ok(existing) if existing.activation_status => return Err(LyceumError::AlreadyActive),
            Ok(_) => return Err(LyceumError::AlreadyExists { entity: "user" }),
            Err(LyceumError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let invitation_token =
            token::issue_email_token(&[email.to_owned(), actor.email.clone()], &self.config)?;
        send_detached(
            &self.mailer,
            OutgoingMail::new(email, mail::STUDENT_VALIDATION, "Token Student Validation")
                .with_context(json!({ "token_student_validation": invitation_token })),
        );

        Ok(())
    }

    /// Register a student through an invitation token.
    ///
    /// The inviter must still hold the INSTITUTE profile; the inactive
    /// student account and the student record are created in one
    /// transaction, and the activation email follows after commit.
    pub async fn register(
        &self,
        invitation_token: &str,
        input: RegisterStudent,
    ) -> LyceumResult<(User, Student)> {
        let emails = token::verify_email_token(invitation_token, &self.config)?;
        let [student_email, inviter_email] = emails.as_slice() else {
            return Err(LyceumError::MalformedCredential(
                "invitation token must carry a student/inviter address pair".into(),
            ));
        };

        let inviter = match self.users.get_by_email(inviter_email).await {
            Ok(user) if user.profile == Profile::Institute => user,
            Ok(_) | Err(LyceumError::NotFound { .. }) => {
                return Err(LyceumError::NotFound {
                    entity: "institute admin",
                    id: inviter_email.clone(),
                });
            }
            Err(e) => return Err(e),
        };
        let inviter_employee = self
            .employees
            .find_by_user(inviter.id)
            .await?
            .ok_or(LyceumError::NotFound {
                entity: "employee",
                id: inviter.id.to_string(),
            })?;

        match self.users.get_by_email(student_email).await {
            Ok(_) => return Err(LyceumError::AlreadyExists { entity: "user" }),
            Err(LyceumError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        validate::phone_number(&input.phone_number)?;
        let birthday_date = validate::date(&input.birthday_date)?;

        let (user, student) = self
            .students
            .create_with_user(
                CreateUser {
                    email: student_email.clone(),
                    name: input.name,
                    phone_number: input.phone_number,
                    profile: Profile::Student,
                    password_hash: None,
                },
                inviter_employee.institute_id,
                CreateStudent {
                    birthday_date,
                    gender: input.gender,
                    disabled_person: input.disabled_person,
                    address: input.address,
                },
            )
            .await?;

        let activation_token =
            token::issue_email_token(std::slice::from_ref(&user.email), &self.config)?;
        send_detached(
            &self.mailer,
            OutgoingMail::new(
                user.email.clone(),
                mail::USER_ACTIVATION,
                "Token User Activation",
            )
            .with_context(json!({ "token_user_activation": activation_token })),
        );

        Ok((user, student))
    }

    /// Update the acting student's own record and account fields.
    pub async fn update(&self, actor: &User, input: UpdateStudentProfile) -> LyceumResult<Student> {
        let student = self.student_of(actor).await?;

        if input.name.is_some() || input.phone_number.is_some() {
            if let Some(phone) = &input.phone_number {
                validate::phone_number(phone)?;
            }
            self.users
                .update(
                    actor.id,
                    UpdateUser {
                        name: input.name,
                        phone_number: input.phone_number,
                        ..UpdateUser::default()
                    },
                )
                .await?;
        }

        self.students.update(student.id, input.student).await
    }

    /// Delete the acting student's own record (with its address and
    /// document); the account itself survives.
    pub async fn delete(&self, actor: &User) -> LyceumResult<()> {
        let student = self.student_of(actor).await?;
        self.students.delete(student.id).await
    }

    /// Page over the students of the actor's institute.
    pub async fn list(
        &self,
        actor: &User,
        params: &QueryParams,
    ) -> LyceumResult<PageResult<Student>> {
        let employee = self.employee_of(actor).await?;
        let filters = build_filters(STUDENT_FILTERS, params);
        let sort = parse_sort(params, STUDENT_SORTABLE)?;
        let page = PageRequest::from_params(params);
        self.students
            .list(employee.institute_id, filters, sort, page)
            .await
    }

    /// Fetch one student by id under the scoping rules: a student only
    /// itself, an employee only students of its institute.
    pub async fn find_by_id(&self, actor: &User, student_id: Uuid) -> LyceumResult<Student> {
        let ctx = match actor.profile {
            Profile::Student => {
                let own = self.student_of(actor).await?;
                // Reject before touching the target so that a student
                // cannot probe which ids exist.
                if own.id != student_id {
                    return Err(LyceumError::CrossTenantAccess);
                }
                ActorContext::new(actor.id, actor.profile)
                    .with_institute(own.institute_id)
                    .with_student(own.id)
            }
            _ => {
                let employee = self.employee_of(actor).await?;
                ActorContext::new(actor.id, actor.profile).with_institute(employee.institute_id)
            }
        };

        let target = self.students.get_by_id(student_id).await?;
        check_student_access(&ctx, target.id, target.institute_id)?;
        Ok(target)
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

    async fn student_of(&self, actor: &User) -> LyceumResult<Student> {
        self.students
            .find_by_user(actor.id)
            .await?
            .ok_or(LyceumError::NotFound {
                entity: "student",
                id: actor.id.to_string(),
            })
    }
}
