use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

use crate::{AuthzError, Permission, Role};

/// An authenticated account acting on the system.
///
/// Resolved by the caller from its session and passed explicitly into every
/// write; the core never reads an ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Grants on top of what the roles give.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Actor {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            display_name: String::new(),
            roles,
            permissions: vec![],
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, vec![Role::ADMIN])
    }

    pub fn operator(user_id: UserId) -> Self {
        Self::new(user_id, vec![Role::OPERATOR])
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}

/// Session/context object owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    actor: Option<Actor>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn require_actor(&self) -> Result<&Actor, AuthzError> {
        self.actor.as_ref().ok_or(AuthzError::NotAuthenticated)
    }

    pub fn sign_out(&mut self) {
        self.actor = None;
    }
}
