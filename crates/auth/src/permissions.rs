use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "movements.record").
/// The wildcard `"*"` grants everything and is what the admin role carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    /// Register entries and exits.
    pub const MOVEMENTS_RECORD: Permission = Permission(Cow::Borrowed("movements.record"));
    /// Soft-delete ledger records.
    pub const MOVEMENTS_DEACTIVATE: Permission = Permission(Cow::Borrowed("movements.deactivate"));
    /// Register and retire items, trucks and employees.
    pub const CATALOG_MANAGE: Permission = Permission(Cow::Borrowed("catalog.manage"));
    /// Read stock levels and reports.
    pub const STOCK_READ: Permission = Permission(Cow::Borrowed("stock.read"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
