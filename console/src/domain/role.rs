//! Operator roles, permissions and field-level access checks.
//!
//! Roles form a total order used for minimum-role checks. Permission sets are
//! listed explicitly per role; higher roles carry supersets by convention, not
//! by derivation, so editing one set never silently widens another.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::field_spec::FieldSpec;

/// Operator privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Customer support staff.
    Support,
    /// Tenant administrator.
    Admin,
    /// Cross-tenant administrator.
    SuperAdmin,
    /// Platform operator.
    PlatformAdmin,
}

/// Roles from lowest to highest privilege.
pub const ROLE_HIERARCHY: [Role; 4] = [
    Role::Support,
    Role::Admin,
    Role::SuperAdmin,
    Role::PlatformAdmin,
];

impl Role {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Admin => "admin",
            Self::SuperAdmin => "super-admin",
            Self::PlatformAdmin => "platform-admin",
        }
    }

    /// Position in [`ROLE_HIERARCHY`].
    #[must_use]
    pub fn rank(self) -> usize {
        ROLE_HIERARCHY
            .iter()
            .position(|role| *role == self)
            .unwrap_or_default()
    }

    /// Whether this role meets `min_role`.
    #[must_use]
    pub fn satisfies(self, min_role: Self) -> bool {
        self.rank() >= min_role.rank()
    }

    /// Capabilities granted to this role.
    #[must_use]
    pub fn permissions(self) -> BTreeSet<Permission> {
        use Permission::{
            ImpersonateUsers, ManageBilling, ManagePlatform, ManageSettings, ManageTenants,
            ManageUsers, ViewAuditLogs, ViewBilling, ViewSecurityEvents, ViewTenants, ViewUsers,
        };
        let granted: &[Permission] = match self {
            Self::Support => &[ViewUsers, ViewTenants],
            Self::Admin => &[ViewUsers, ViewTenants, ViewAuditLogs, ManageUsers],
            Self::SuperAdmin => &[
                ViewUsers,
                ViewTenants,
                ViewAuditLogs,
                ViewBilling,
                ViewSecurityEvents,
                ManageUsers,
                ManageTenants,
                ManageSettings,
            ],
            Self::PlatformAdmin => &[
                ViewUsers,
                ViewTenants,
                ViewAuditLogs,
                ViewBilling,
                ViewSecurityEvents,
                ManageUsers,
                ManageTenants,
                ManageSettings,
                ManageBilling,
                ManagePlatform,
                ImpersonateUsers,
            ],
        };
        granted.iter().copied().collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {input}")]
pub struct ParseRoleError {
    /// The unrecognised input value.
    pub input: String,
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ROLE_HIERARCHY
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseRoleError {
                input: s.to_owned(),
            })
    }
}

/// Fixed capability an operator may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// Read user records.
    ViewUsers,
    /// Read tenant records.
    ViewTenants,
    /// Read audit logs.
    ViewAuditLogs,
    /// Read billing and revenue data.
    ViewBilling,
    /// Read security events and risk data.
    ViewSecurityEvents,
    /// Modify users.
    ManageUsers,
    /// Modify tenants.
    ManageTenants,
    /// Modify console settings.
    ManageSettings,
    /// Modify billing.
    ManageBilling,
    /// Operate the platform itself.
    ManagePlatform,
    /// Act as another user.
    ImpersonateUsers,
    /// Any permission name this build does not know. No role holds it.
    #[serde(other)]
    Unrecognized,
}

/// Minimum-role rule attached to a field.
///
/// Role names this build does not know are kept for diagnostics and admit no
/// operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum MinRole {
    /// A role from [`ROLE_HIERARCHY`].
    Known(Role),
    /// An unrecognised role name.
    Unknown(String),
}

impl MinRole {
    /// Whether an operator with `user_role` meets this rule.
    #[must_use]
    pub fn admits(&self, user_role: &str) -> bool {
        match self {
            Self::Known(min_role) => user_role
                .parse::<Role>()
                .is_ok_and(|role| role.satisfies(*min_role)),
            Self::Unknown(_) => false,
        }
    }
}

impl From<Role> for MinRole {
    fn from(role: Role) -> Self {
        Self::Known(role)
    }
}

impl From<String> for MinRole {
    fn from(raw: String) -> Self {
        match raw.parse::<Role>() {
            Ok(role) => Self::Known(role),
            Err(_) => Self::Unknown(raw),
        }
    }
}

/// Rank of a raw role string, or `None` when the role is unknown.
#[must_use]
pub fn role_rank(role: &str) -> Option<usize> {
    role.parse::<Role>().ok().map(Role::rank)
}

/// Whether `user_role` meets `min_role`. Unknown roles on either side fail.
///
/// # Examples
///
/// ```
/// # use admin_console::domain::role_sufficient;
/// assert!(role_sufficient("admin", "support"));
/// assert!(!role_sufficient("support", "admin"));
/// assert!(!role_sufficient("janitor", "support"));
/// ```
#[must_use]
pub fn role_sufficient(user_role: &str, min_role: &str) -> bool {
    match (role_rank(user_role), role_rank(min_role)) {
        (Some(user), Some(min)) => user >= min,
        _ => false,
    }
}

/// Permission set for a raw role string; empty for unknown roles.
#[must_use]
pub fn get_role_permissions(role: &str) -> BTreeSet<Permission> {
    role.parse::<Role>()
        .map(Role::permissions)
        .unwrap_or_default()
}

/// Whether an operator with `role` may see `field`.
///
/// `required_permissions` is checked first and, when present, decides alone.
/// Otherwise `min_role` applies. Fields with neither rule are public.
/// Unrecognised permissions and role names never match.
#[must_use]
pub fn has_field_permission(field: &FieldSpec, role: &str) -> bool {
    if let Some(required) = &field.required_permissions {
        let granted = get_role_permissions(role);
        return !granted.is_disjoint(required);
    }
    if let Some(min_role) = &field.min_role {
        return min_role.admits(role);
    }
    true
}
