use thiserror::Error;

use crate::{Actor, Permission, roles::default_permissions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize an actor for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(actor: &Actor, required: &Permission) -> Result<(), AuthzError> {
    let granted = actor
        .roles
        .iter()
        .flat_map(default_permissions)
        .chain(actor.permissions.iter().cloned())
        .any(|p| p.is_wildcard() || p == *required);

    if granted {
        Ok(())
    } else {
        tracing::debug!(user_id = %actor.user_id, permission = %required, "authorization denied");
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Resolve an optional actor and authorize it in one step.
pub fn require<'a>(actor: Option<&'a Actor>, required: &Permission) -> Result<&'a Actor, AuthzError> {
    let actor = actor.ok_or(AuthzError::NotAuthenticated)?;
    authorize(actor, required)?;
    Ok(actor)
}

#[cfg(test)]
mod tests {
    use stockroom_core::UserId;

    use super::*;
    use crate::{Role, Session};

    #[test]
    fn admin_wildcard_grants_everything() {
        let admin = Actor::admin(UserId::new());
        assert!(authorize(&admin, &Permission::CATALOG_MANAGE).is_ok());
        assert!(authorize(&admin, &Permission::MOVEMENTS_DEACTIVATE).is_ok());
    }

    #[test]
    fn operator_records_but_cannot_manage_catalog() {
        let operator = Actor::operator(UserId::new());
        assert!(authorize(&operator, &Permission::MOVEMENTS_RECORD).is_ok());
        assert_eq!(
            authorize(&operator, &Permission::CATALOG_MANAGE),
            Err(AuthzError::Forbidden("catalog.manage".to_string()))
        );
    }

    #[test]
    fn explicit_grant_extends_roles() {
        let mut operator = Actor::operator(UserId::new());
        operator.permissions.push(Permission::MOVEMENTS_DEACTIVATE);
        assert!(authorize(&operator, &Permission::MOVEMENTS_DEACTIVATE).is_ok());
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let guest = Actor::new(UserId::new(), vec![Role::new("guest")]);
        assert!(authorize(&guest, &Permission::STOCK_READ).is_err());
    }

    #[test]
    fn missing_actor_is_not_authenticated() {
        let session = Session::anonymous();
        assert_eq!(
            require(session.actor(), &Permission::STOCK_READ).unwrap_err(),
            AuthzError::NotAuthenticated
        );
        assert_eq!(session.require_actor().unwrap_err(), AuthzError::NotAuthenticated);
    }

    #[test]
    fn signed_in_session_resolves_actor() {
        let actor = Actor::operator(UserId::new()).with_display_name("Carla");
        let mut session = Session::signed_in(actor.clone());
        assert_eq!(require(session.actor(), &Permission::MOVEMENTS_RECORD).unwrap(), &actor);
        session.sign_out();
        assert!(session.actor().is_none());
    }
}
