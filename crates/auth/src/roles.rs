use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Full access, including the privileged registration screens.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Warehouse staff: records movements and reads stock.
    pub const OPERATOR: Role = Role(Cow::Borrowed("operator"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        *self == Role::ADMIN
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Built-in role → permission policy. Unknown roles grant nothing.
pub fn default_permissions(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::WILDCARD],
        "operator" => vec![Permission::MOVEMENTS_RECORD, Permission::STOCK_READ],
        _ => vec![],
    }
}
