//! Role-based access for ledger operations.
//!
//! Every ledger read and report receives an [`AuthorizationScope`] built from
//! the authenticated principal. The scope decides which mutations a role may
//! perform and which students' records it may see.

use uuid::Uuid;

use bursar_shared::{Claims, Role};

use super::error::FeeError;

/// Ledger mutations guarded by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Create, update and (de)activate fee categories.
    ManageCatalog,
    /// Assign obligations to students or classes.
    AssignFees,
    /// Waive an obligation.
    WaiveFees,
    /// Record a payment.
    RecordPayment,
    /// Reverse a payment.
    ReversePayment,
}

impl Permission {
    const fn action(self) -> &'static str {
        match self {
            Self::ManageCatalog => "manage fee categories",
            Self::AssignFees => "assign fees",
            Self::WaiveFees => "waive fees",
            Self::RecordPayment => "record payments",
            Self::ReversePayment => "reverse payments",
        }
    }
}

/// Which students' ledger rows a principal may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every student.
    All,
    /// Students in the classes this teacher teaches.
    TaughtBy(Uuid),
    /// The student whose principal id this is.
    SelfStudent(Uuid),
    /// The children of this guardian.
    ChildrenOf(Uuid),
}

/// The authenticated principal threaded into every ledger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationScope {
    /// Principal role.
    pub role: Role,
    /// Principal ID.
    pub principal_id: Uuid,
}

impl AuthorizationScope {
    /// Creates a scope.
    #[must_use]
    pub const fn new(role: Role, principal_id: Uuid) -> Self {
        Self { role, principal_id }
    }

    /// Returns true if the role holds `permission`.
    #[must_use]
    pub const fn can(&self, permission: Permission) -> bool {
        match permission {
            Permission::RecordPayment => matches!(self.role, Role::Admin | Role::Staff),
            Permission::ManageCatalog
            | Permission::AssignFees
            | Permission::WaiveFees
            | Permission::ReversePayment => matches!(self.role, Role::Admin),
        }
    }

    /// Requires `permission`.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::Forbidden` if the role lacks it.
    pub fn require(&self, permission: Permission) -> Result<(), FeeError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(FeeError::Forbidden {
                role: self.role.as_str(),
                action: permission.action(),
            })
        }
    }

    /// Returns the row visibility for reads.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        match self.role {
            Role::Admin | Role::Staff => Visibility::All,
            Role::Teacher => Visibility::TaughtBy(self.principal_id),
            Role::Student => Visibility::SelfStudent(self.principal_id),
            Role::Parent => Visibility::ChildrenOf(self.principal_id),
        }
    }
}

impl From<&Claims> for AuthorizationScope {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.role, claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Role::Admin, true, true)]
    #[case(Role::Staff, true, false)]
    #[case(Role::Teacher, false, false)]
    #[case(Role::Student, false, false)]
    #[case(Role::Parent, false, false)]
    fn test_permissions(#[case] role: Role, #[case] can_record: bool, #[case] can_admin: bool) {
        let scope = AuthorizationScope::new(role, Uuid::new_v4());
        assert_eq!(scope.can(Permission::RecordPayment), can_record);
        assert_eq!(scope.can(Permission::ReversePayment), can_admin);
        assert_eq!(scope.can(Permission::AssignFees), can_admin);
        assert_eq!(scope.can(Permission::WaiveFees), can_admin);
        assert_eq!(scope.can(Permission::ManageCatalog), can_admin);
    }

    #[test]
    fn test_forbidden_message() {
        let scope = AuthorizationScope::new(Role::Teacher, Uuid::nil());
        let err = scope.require(Permission::RecordPayment).unwrap_err();
        assert_eq!(err.to_string(), "Role teacher cannot record payments");
        assert_eq!(err.http_status_code(), 403);
    }

    #[test]
    fn test_visibility() {
        let id = Uuid::new_v4();
        assert_eq!(
            AuthorizationScope::new(Role::Staff, id).visibility(),
            Visibility::All
        );
        assert_eq!(
            AuthorizationScope::new(Role::Teacher, id).visibility(),
            Visibility::TaughtBy(id)
        );
        assert_eq!(
            AuthorizationScope::new(Role::Student, id).visibility(),
            Visibility::SelfStudent(id)
        );
        assert_eq!(
            AuthorizationScope::new(Role::Parent, id).visibility(),
            Visibility::ChildrenOf(id)
        );
    }
}
