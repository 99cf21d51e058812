//! Caller identity - the already-authenticated principal behind an intent
//!
//! Authentication and token verification live in an external collaborator;
//! by the time an intent reaches this crate the caller's identity and role
//! have been validated. Operations here only check ownership and role
//! against that trusted identity, which keeps the validator and the
//! coordinators pure and independently testable.

use serde::{Deserialize, Serialize};

/// The three caller roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns experiments and their sessions.
    Researcher,
    /// Registers for sessions.
    Subject,
    /// Gates `pending_review` experiments and may cancel anything.
    Admin,
}

/// An authenticated caller: user id plus validated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user_id: String,
    role: Role,
}

impl Caller {
    /// Create a caller with the given role.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// A researcher caller.
    #[must_use]
    pub fn researcher(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Researcher)
    }

    /// A subject caller.
    #[must_use]
    pub fn subject(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Subject)
    }

    /// An admin caller.
    #[must_use]
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// Get the user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get the validated role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Whether the caller is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the caller owns the given resource, or is an admin.
    #[must_use]
    pub fn owns(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership() {
        let researcher = Caller::researcher("res-1");
        assert!(researcher.owns("res-1"));
        assert!(!researcher.owns("res-2"));
        // Admins bypass ownership.
        assert!(Caller::admin("adm-1").owns("res-2"));
    }
}
