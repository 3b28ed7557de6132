//! Port for the authentication collaborator.
//!
//! Session and token handling live outside this crate. The console only needs
//! to know who is looking and to drop the session when the settings backend
//! answers `401`.

/// Source of the current operator's role and owner of the session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionAuthority: Send + Sync {
    /// Role string of the signed-in operator, if any.
    fn current_role(&self) -> Option<String>;

    /// Discard the current session. Called after an unauthorised response.
    fn invalidate_session(&self);
}

/// Fixture authority with a fixed role that ignores invalidation.
#[derive(Debug, Default, Clone)]
pub struct FixtureSessionAuthority {
    role: Option<String>,
}

impl FixtureSessionAuthority {
    /// Authority reporting `role` for every call.
    #[must_use]
    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
        }
    }
}

impl SessionAuthority for FixtureSessionAuthority {
    fn current_role(&self) -> Option<String> {
        self.role.clone()
    }

    fn invalidate_session(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_reports_configured_role() {
        let authority = FixtureSessionAuthority::with_role("admin");
        authority.invalidate_session();
        assert_eq!(authority.current_role().as_deref(), Some("admin"));
    }

    #[test]
    fn default_fixture_is_signed_out() {
        assert!(FixtureSessionAuthority::default().current_role().is_none());
    }
}
