//! Institute registration and self-scoped tenant management.

use serde::Deserialize;
use serde_json::json;

use lyceum_auth::config::AuthConfig;
use lyceum_auth::mail::{self, send_detached};
use lyceum_auth::token;
use lyceum_core::error::{LyceumError, LyceumResult};
use lyceum_core::external::{Mailer, OutgoingMail};
use lyceum_core::models::address::Address;
use lyceum_core::models::employee::Employee;
use lyceum_core::models::institute::{CreateInstitute, Institute, UpdateInstitute};
use lyceum_core::models::user::{CreateUser, Profile, User};
use lyceum_core::query::{
    INSTITUTE_FILTERS, INSTITUTE_SORTABLE, PageRequest, PageResult, QueryParams, build_filters,
    parse_sort,
};
use lyceum_core::repository::{EmployeeRepository, InstituteRepository, UserRepository};
use lyceum_core::validate;

/// Admin account supplied atomically with the institute.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminAccount {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    /// Free-text role label for the admin's employee record.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInstitute {
    pub cnpj: String,
    pub trading_name: String,
    pub corporate_name: String,
    pub address: Address,
    pub admin: AdminAccount,
}

pub struct InstituteService<I, E, U, M>
where
    I: InstituteRepository,
    E: EmployeeRepository,
    U: UserRepository,
    M: Mailer + Clone,
{
    institutes: I,
    employees: E,
    users: U,
    mailer: M,
    config: AuthConfig,
}

impl<I, E, U, M> InstituteService<I, E, U, M>
where
    I: InstituteRepository,
    E: EmployeeRepository,
    U: UserRepository,
    M: Mailer + Clone,
{
    pub fn new(institutes: I, employees: E, users: U, mailer: M, config: AuthConfig) -> Self {
        Self {
            institutes,
            employees,
            users,
            mailer,
            config,
        }
    }

    /// Register a new institute together with its admin account.
    ///
    /// The institute, the admin user and their binding employee record
    /// are created in one transaction; the activation email is
    /// dispatched only after the transaction committed, fire-and-forget.
    pub async fn register(&self, input: RegisterInstitute) -> LyceumResult<(Institute, User)> {
        validate::cnpj(&input.cnpj)?;
        validate::email(&input.admin.email)?;
        validate::phone_number(&input.admin.phone_number)?;

        match self.users.get_by_email(&input.admin.email).await {
            Ok(_) => return Err(LyceumError::AlreadyExists { entity: "user" }),
            Err(LyceumError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        match self.institutes.get_by_cnpj(&input.cnpj).await {
            Ok(_) => return Err(LyceumError::AlreadyExists { entity: "institute" }),
            Err(LyceumError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let (institute, admin) = self
            .institutes
            .create_with_admin(
                CreateInstitute {
                    cnpj: input.cnpj,
                    trading_name: input.trading_name,
                    corporate_name: input.corporate_name,
                    address: input.address,
                },
                CreateUser {
                    email: input.admin.email,
                    name: input.admin.name,
                    phone_number: input.admin.phone_number,
                    profile: Profile::Institute,
                    password_hash: None,
                },
                input.admin.role,
            )
            .await?;

        let activation_token =
            token::issue_email_token(std::slice::from_ref(&admin.email), &self.config)?;
        send_detached(
            &self.mailer,
            OutgoingMail::new(
                admin.email.clone(),
                mail::USER_ACTIVATION,
                "Token User Activation",
            )
            .with_context(json!({ "token_user_activation": activation_token })),
        );

        tracing::info!(institute = %institute.id, "institute registered");
        Ok((institute, admin))
    }

    /// Update the acting identity's own institute.
    pub async fn update(&self, actor: &User, input: UpdateInstitute) -> LyceumResult<Institute> {
        let employee = self.employee_of(actor).await?;
        self.institutes.update(employee.institute_id, input).await
    }

    /// Delete the acting identity's own institute, cascading to all of
    /// its employees, students and their accounts.
    pub async fn delete(&self, actor: &User) -> LyceumResult<()> {
        let employee = self.employee_of(actor).await?;
        self.institutes.delete(employee.institute_id).await
    }

    /// The acting identity's own institute.
    pub async fn info(&self, actor: &User) -> LyceumResult<Institute> {
        let employee = self.employee_of(actor).await?;
        self.institutes.get_by_id(employee.institute_id).await
    }

    /// Paginated institute listing. Requires only a valid credential;
    /// the route verifies it without resolving the identity.
    pub async fn list(&self, params: &QueryParams) -> LyceumResult<PageResult<Institute>> {
        let filters = build_filters(INSTITUTE_FILTERS, params);
        let sort = parse_sort(params, INSTITUTE_SORTABLE)?;
        let page = PageRequest::from_params(params);
        self.institutes.list(filters, sort, page).await
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
}
