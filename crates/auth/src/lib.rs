//! `stockroom-auth` - authentication/authorization boundary.
//!
//! The identity provider itself is an external collaborator; this crate only
//! models the resolved actor and the role gate in front of privileged
//! operations. It is intentionally decoupled from transport and storage.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize, require};
pub use permissions::Permission;
pub use principal::{Actor, Session};
pub use roles::{Role, default_permissions};
