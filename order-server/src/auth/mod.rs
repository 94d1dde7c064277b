//! Requester Identity
//!
//! Authentication itself lives in the upstream identity service; by the
//! time a request reaches this service the gateway has resolved the caller
//! and forwarded identity as trusted headers:
//!
//! - `x-user-id`: numeric buyer id
//! - `x-user-role`: `admin` | `co_worker` | `customer`
//!
//! Requests without these headers are anonymous (guest flows).

use axum::extract::FromRequestParts;
use http::request::Parts;
use serde::{Deserialize, Serialize};
use shared::AppError;

/// Role assigned by the identity service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    CoWorker,
    Customer,
}

impl Role {
    fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "co_worker" => Some(Role::CoWorker),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

/// The resolved caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    /// No identity headers present (guest flows)
    Anonymous,
    User { id: i64, role: Role },
}

impl Requester {
    /// Staff can administer orders but never assert buyer-side proof.
    pub fn is_staff(&self) -> bool {
        matches!(
            self,
            Requester::User {
                role: Role::Admin | Role::CoWorker,
                ..
            }
        )
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Requester::User { id, .. } => Some(*id),
            Requester::Anonymous => None,
        }
    }

    /// Whether this requester owns the given order user id.
    pub fn owns(&self, order_user_id: Option<i64>) -> bool {
        match (self.user_id(), order_user_id) {
            (Some(me), Some(owner)) => me == owner,
            _ => false,
        }
    }

    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Requester::Anonymous => "anonymous",
            Requester::User {
                role: Role::Admin, ..
            } => "admin",
            Requester::User {
                role: Role::CoWorker,
                ..
            } => "co_worker",
            Requester::User {
                role: Role::Customer,
                ..
            } => "customer",
        }
    }

    /// Reject anonymous callers.
    pub fn require_user(&self) -> Result<(i64, Role), AppError> {
        match self {
            Requester::User { id, role } => Ok((*id, *role)),
            Requester::Anonymous => Err(AppError::not_authenticated()),
        }
    }

    /// Reject everyone below staff.
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::permission_denied("Staff role required"))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Requester {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());
        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse);

        match (id, role) {
            (Some(id), Some(role)) => Ok(Requester::User { id, role }),
            // Mismatched half-identities are treated as anonymous rather
            // than rejected; the gateway owns header integrity
            _ => Ok(Requester::Anonymous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_roles() {
        let admin = Requester::User {
            id: 1,
            role: Role::Admin,
        };
        let worker = Requester::User {
            id: 2,
            role: Role::CoWorker,
        };
        let customer = Requester::User {
            id: 3,
            role: Role::Customer,
        };
        assert!(admin.is_staff());
        assert!(worker.is_staff());
        assert!(!customer.is_staff());
        assert!(!Requester::Anonymous.is_staff());
    }

    #[test]
    fn test_ownership() {
        let customer = Requester::User {
            id: 3,
            role: Role::Customer,
        };
        assert!(customer.owns(Some(3)));
        assert!(!customer.owns(Some(4)));
        assert!(!customer.owns(None)); // guest orders have no owner
        assert!(!Requester::Anonymous.owns(Some(3)));
    }

    #[test]
    fn test_require_user() {
        assert!(Requester::Anonymous.require_user().is_err());
        let user = Requester::User {
            id: 7,
            role: Role::Customer,
        };
        assert_eq!(user.require_user().unwrap().0, 7);
    }
}
