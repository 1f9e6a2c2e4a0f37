//! Employee invitation and institute-scoped employee management.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use lyceum_auth::config::AuthConfig;
use lyceum_auth::mail::{self, send_detached};
use lyceum_auth::token;
use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::external::{Mailer, OutgoingMail};
use lyceum_core::models::employee::Employee;
use lyceum_core::models::user::{CreateUser, Profile, UpdateUser, User};
use lyceum_core::query::{
    PageRequest, PageResult, QueryParams, USER_FILTERS, USER_SORTABLE, build_filters, parse_sort,
};
use lyceum_core::repository::{EmployeeRepository, UserRepository};
use lyceum_core::scope::{ActorContext, check_same_institute};
use lyceum_core::validate;

#[derive(Debug, Clone, Deserialize)]
pub struct InviteEmployee {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: Option<String>,
}

/// Profile fields an institute admin may change on an employee.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmployeeProfile {
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

pub struct EmployeeService<E, U, M>
where
    E: EmployeeRepository,
    U: UserRepository,
    M: Mailer + Clone,
{
    employees: E,
    users: U,
    mailer: M,
    config: AuthConfig,
}

impl<E, U, M> EmployeeService<E, U, M>
where
    E: EmployeeRepository,
    U: UserRepository,
    M: Mailer + Clone,
{
    pub fn new(employees: E, users: U, mailer: M, config: AuthConfig) -> Self {
        Self {
            employees,
            users,
            mailer,
            config,
        }
    }

    /// Invite a user into the actor's institute. The inactive account
    /// and its employee record are created in one transaction; the
    /// activation email follows fire-and-forget.
    pub async fn invite(&self, actor: &User, input: InviteEmployee) -> LyceumResult<User> {
        let employee = self.employee_of(actor).await?;

        validate::email(&input.email)?;
        validate::phone_number(&input.phone_number)?;

        match self.users.get_by_email(&input.email).await {
            Ok(existing) if existing.activation_status => return Err(LyceumError::AlreadyActive),
            Ok(_) => return Err(LyceumError::AlreadyExists { entity: "user" }),
            Err(LyceumError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let (user, _) = self
            .employees
            .create_with_user(
                CreateUser {
                    email: input.email,
                    name: input.name,
                    phone_number: input.phone_number,
                    profile: Profile::Employee,
                    password_hash: None,
                },
                employee.institute_id,
                input.role,
            )
            .await?;

        let activation_token =
            token::issue_email_token(std::slice::from_ref(&user.email), &self.config)?;
        send_detached(
            &self.mailer,
            OutgoingMail::new(
                user.email.clone(),
                mail::EMPLOYEE_ACTIVATION,
                "Token Employee Activation",
            )
            .with_context(json!({ "token_employee_activation": activation_token })),
        );

        Ok(user)
    }

    /// Page over the users employed by the actor's institute.
    pub async fn list(&self, actor: &User, params: &QueryParams) -> LyceumResult<PageResult<User>> {
        let employee = self.employee_of(actor).await?;
        let filters = build_filters(USER_FILTERS, params);
        let sort = parse_sort(params, USER_SORTABLE)?;
        let page = PageRequest::from_params(params);
        self.employees
            .list_users(employee.institute_id, filters, sort, page)
            .await
    }

    /// Update an employee of the actor's own institute.
    pub async fn update(
        &self,
        actor: &User,
        target_user_id: Uuid,
        input: UpdateEmployeeProfile,
    ) -> LyceumResult<User> {
        let target = self.scoped_target(actor, target_user_id).await?;
        self.users
            .update(
                target.user_id,
                UpdateUser {
                    name: input.name,
                    phone_number: input.phone_number,
                    ..UpdateUser::default()
                },
            )
            .await
    }

    /// Delete an employee of the actor's own institute, together with
    /// its account. The actor itself is never a valid target.
    pub async fn delete(&self, actor: &User, target_user_id: Uuid) -> LyceumResult<()> {
        if target_user_id == actor.id {
            return Err(LyceumError::NotFound {
                entity: "employee",
                id: target_user_id.to_string(),
            });
        }
        let target = self.scoped_target(actor, target_user_id).await?;
        self.users.delete(target.user_id).await
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

    /// Resolve the target's employee record and enforce that it
    /// belongs to the actor's institute.
    async fn scoped_target(&self, actor: &User, target_user_id: Uuid) -> LyceumResult<Employee> {
        let employee = self.employee_of(actor).await?;
        let target = self
            .employees
            .find_by_user(target_user_id)
            .await?
            .ok_or(LyceumError::NotFound {
                entity: "employee",
                id: target_user_id.to_string(),
            })?;

        let ctx = ActorContext::new(actor.id, actor.profile).with_institute(employee.institute_id);
        check_same_institute(&ctx, target.institute_id)?;
        Ok(target)
    }
}
