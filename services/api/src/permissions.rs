//! Request and object level permissions
//!
//! Reads are open to everyone. Writes need an authenticated caller, and
//! changing an existing object needs its owner or a superuser.

use axum::http::Method;

use crate::{error::ApiError, middleware::AuthUser};

const FORBIDDEN: &str = "You do not have permission to perform this action.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn from_method(method: &Method) -> Self {
        if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
            Access::Read
        } else {
            Access::Write
        }
    }
}

/// Request-level check, before any object is loaded
pub fn has_permission(access: Access, user: Option<&AuthUser>) -> Result<(), ApiError> {
    match (access, user) {
        (Access::Read, _) | (Access::Write, Some(_)) => Ok(()),
        (Access::Write, None) => Err(ApiError::Unauthorized),
    }
}

/// Object-level check against the object's owner
pub fn has_object_permission(
    access: Access,
    user: Option<&AuthUser>,
    owner_id: i64,
) -> Result<(), ApiError> {
    has_permission(access, user)?;
    match (access, user) {
        (Access::Read, _) => Ok(()),
        (Access::Write, Some(user)) if user.is_superuser || user.id == owner_id => Ok(()),
        (Access::Write, _) => Err(ApiError::Forbidden(FORBIDDEN.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(id: i64, is_superuser: bool) -> AuthUser {
        AuthUser {
            id,
            is_superuser,
            token_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_access_from_method() {
        assert_eq!(Access::from_method(&Method::GET), Access::Read);
        assert_eq!(Access::from_method(&Method::HEAD), Access::Read);
        assert_eq!(Access::from_method(&Method::POST), Access::Write);
        assert_eq!(Access::from_method(&Method::PATCH), Access::Write);
        assert_eq!(Access::from_method(&Method::DELETE), Access::Write);
    }

    #[test]
    fn test_anonymous_can_read_not_write() {
        assert!(has_permission(Access::Read, None).is_ok());
        assert!(matches!(
            has_permission(Access::Write, None),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            has_object_permission(Access::Write, None, 1),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_owner_and_superuser_can_write() {
        assert!(has_object_permission(Access::Write, Some(&user(1, false)), 1).is_ok());
        assert!(has_object_permission(Access::Write, Some(&user(2, true)), 1).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let err = has_object_permission(Access::Write, Some(&user(2, false)), 1).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(msg) if msg == FORBIDDEN));
        assert!(has_object_permission(Access::Read, Some(&user(2, false)), 1).is_ok());
    }
}
