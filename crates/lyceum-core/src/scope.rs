//! Tenant scoping rules.
//!
//! Pure predicates over the acting identity and the target record's
//! attributes. Services evaluate these before touching the store, so
//! the rules are unit-testable without a database or transport layer.

use uuid::Uuid;

use crate::error::{LyceumError, LyceumResult};
use crate::models::user::Profile;

/// The resolved identity plus its specialization attributes, as far as
/// they exist. Built once per request by the service layer.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub profile: Profile,
    /// Institute the actor belongs to, via its employee or student record.
    pub institute_id: Option<Uuid>,
    /// Set only for STUDENT-profile actors.
    pub student_id: Option<Uuid>,
}

impl ActorContext {
    pub fn new(user_id: Uuid, profile: Profile) -> Self {
        Self {
            user_id,
            profile,
            institute_id: None,
            student_id: None,
        }
    }

    pub fn with_institute(mut self, institute_id: Uuid) -> Self {
        self.institute_id = Some(institute_id);
        self
    }

    pub fn with_student(mut self, student_id: Uuid) -> Self {
        self.student_id = Some(student_id);
        self
    }
}

/// May the actor read or mutate a record owned by `target_institute`?
///
/// Institute-scoped resources (employees, students, documents) are
/// visible to employees of the owning institute only.
pub fn same_institute(actor: &ActorContext, target_institute: Uuid) -> bool {
    actor.institute_id == Some(target_institute)
}

/// May the actor access the student record `target_student` owned by
/// `target_institute`?
///
/// A STUDENT sees only itself; INSTITUTE and EMPLOYEE profiles see the
/// students of their own institute. Violations are authorization
/// failures, deliberately distinct from not-found.
pub fn check_student_access(
    actor: &ActorContext,
    target_student: Uuid,
    target_institute: Uuid,
) -> LyceumResult<()> {
    let permitted = match actor.profile {
        Profile::Student => actor.student_id == Some(target_student),
        _ => same_institute(actor, target_institute),
    };
    if permitted {
        Ok(())
    } else {
        Err(LyceumError::CrossTenantAccess)
    }
}

/// Guard a mutation against an institute-scoped record.
pub fn check_same_institute(actor: &ActorContext, target_institute: Uuid) -> LyceumResult<()> {
    if same_institute(actor, target_institute) {
        Ok(())
    } else {
        Err(LyceumError::CrossTenantAccess)
    }
}

/// Deactivation policy: the actor may deactivate itself, or an
/// INSTITUTE-profile actor may deactivate accounts of its own
/// institute. Cross-institute deactivation is never permitted.
pub fn may_deactivate(
    actor: &ActorContext,
    target_user: Uuid,
    target_institute: Option<Uuid>,
) -> bool {
    if actor.user_id == target_user {
        return true;
    }
    actor.profile == Profile::Institute
        && actor.institute_id.is_some()
        && actor.institute_id == target_institute
}
