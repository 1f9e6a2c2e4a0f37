//! Self-service account operations and the deactivation policy.
//!
//! Every operation here acts on the resolved identity; no caller-supplied
//! id is accepted except for [`UserService::deactivate`], whose target
//! is checked against the deactivation policy.

use serde::Deserialize;
use uuid::Uuid;

use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::models::user::{Profile, UpdateUser, User};
use lyceum_core::repository::{
    EmployeeRepository, InstituteRepository, StudentRepository, UserRepository,
};
use lyceum_core::scope::{ActorContext, may_deactivate};
use lyceum_core::validate;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

pub struct UserService<U, E, S, I>
where
    U: UserRepository,
    E: EmployeeRepository,
    S: StudentRepository,
    I: InstituteRepository,
{
    users: U,
    employees: E,
    students: S,
    institutes: I,
}

impl<U, E, S, I> UserService<U, E, S, I>
where
    U: UserRepository,
    E: EmployeeRepository,
    S: StudentRepository,
    I: InstituteRepository,
{
    pub fn new(users: U, employees: E, students: S, institutes: I) -> Self {
        Self {
            users,
            employees,
            students,
            institutes,
        }
    }

    /// The resolved identity itself.
    pub fn profile(&self, actor: &User) -> User {
        actor.clone()
    }

    /// Update the resolved identity's own account fields.
    pub async fn update_profile(&self, actor: &User, input: UpdateProfile) -> LyceumResult<User> {
        if let Some(email) = &input.email {
            validate::email(email)?;
            match self.users.get_by_email(email).await {
                Ok(existing) if existing.id != actor.id => {
                    return Err(LyceumError::AlreadyExists { entity: "user" });
                }
                Ok(_) | Err(LyceumError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        if let Some(phone) = &input.phone_number {
            validate::phone_number(phone)?;
        }

        self.users
            .update(
                actor.id,
                UpdateUser {
                    name: input.name,
                    phone_number: input.phone_number,
                    email: input.email,
                    ..UpdateUser::default()
                },
            )
            .await
    }

    /// Deactivate an account under the deactivation policy: self, or
    /// an institute admin against accounts of its own institute.
    pub async fn deactivate(&self, actor: &User, target_user_id: Uuid) -> LyceumResult<User> {
        let target = self.users.get_by_id(target_user_id).await?;

        let ctx = self.actor_context(actor).await?;
        let target_institute = self.institute_of(target.id).await?;

        if !may_deactivate(&ctx, target.id, target_institute) {
            return Err(LyceumError::DeactivationForbidden);
        }

        self.users
            .update(
                target.id,
                UpdateUser {
                    activation_status: Some(false),
                    ..UpdateUser::default()
                },
            )
            .await
    }

    /// Delete the resolved identity's own account. For an
    /// INSTITUTE-profile actor this tears down the whole institute.
    pub async fn delete_account(&self, actor: &User) -> LyceumResult<()> {
        if actor.profile == Profile::Institute {
            if let Some(employee) = self.employees.find_by_user(actor.id).await? {
                return self.institutes.delete(employee.institute_id).await;
            }
        }
        self.users.delete(actor.id).await
    }

    async fn actor_context(&self, actor: &User) -> LyceumResult<ActorContext> {
        let mut ctx = ActorContext::new(actor.id, actor.profile);
        if let Some(institute_id) = self.institute_of(actor.id).await? {
            ctx = ctx.with_institute(institute_id);
        }
        Ok(ctx)
    }

    /// The institute a user belongs to, through either specialization.
    async fn institute_of(&self, user_id: Uuid) -> LyceumResult<Option<Uuid>> {
        if let Some(employee) = self.employees.find_by_user(user_id).await? {
            return Ok(Some(employee.institute_id));
        }
        if let Some(student) = self.students.find_by_user(user_id).await? {
            return Ok(Some(student.institute_id));
        }
        Ok(None)
    }
}
