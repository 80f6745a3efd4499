//! Customers, roles and the acting identity

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CustomerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role claim issued by the authentication provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    /// Map a profile role claim; anything but `admin` books as a customer
    pub fn from_claim(claim: &str) -> Self {
        match claim.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::Customer,
        }
    }
}

/// Authentication context supplied by the host application.
pub trait AuthContext: Send + Sync {
    fn current_customer_id(&self) -> DomainResult<CustomerId>;
    fn current_role(&self) -> Role;
}

/// Who is invoking a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Customer(CustomerId),
    Admin(CustomerId),
}

impl Actor {
    pub fn from_context(ctx: &dyn AuthContext) -> DomainResult<Self> {
        let id = ctx.current_customer_id()?;
        Ok(match ctx.current_role() {
            Role::Admin => Actor::Admin(id),
            Role::Customer => Actor::Customer(id),
        })
    }

    pub fn id(&self) -> &CustomerId {
        match self {
            Actor::Customer(id) | Actor::Admin(id) => id,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Actor::Customer(_) => "customer",
            Actor::Admin(_) => "admin",
        }
    }
}

/// Fixed identity, used by the CLI and by tests
#[derive(Debug, Clone)]
pub struct StaticAuthContext {
    customer: Option<CustomerId>,
    role: Role,
}

impl StaticAuthContext {
    pub fn customer(id: impl Into<CustomerId>) -> Self {
        Self {
            customer: Some(id.into()),
            role: Role::Customer,
        }
    }

    pub fn admin(id: impl Into<CustomerId>) -> Self {
        Self {
            customer: Some(id.into()),
            role: Role::Admin,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            customer: None,
            role: Role::Customer,
        }
    }

    /// Role comes from the roster of admin ids, never from the caller
    pub fn from_roster(id: impl Into<CustomerId>, admins: &HashSet<CustomerId>) -> Self {
        let id = id.into();
        let role = if admins.contains(&id) {
            Role::Admin
        } else {
            Role::Customer
        };
        Self {
            customer: Some(id),
            role,
        }
    }
}

impl AuthContext for StaticAuthContext {
    fn current_customer_id(&self) -> DomainResult<CustomerId> {
        self.customer.clone().ok_or(DomainError::Unauthenticated)
    }

    fn current_role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ErrorKind;

    #[test]
    fn role_claims() {
        assert_eq!(Role::from_claim("admin"), Role::Admin);
        assert_eq!(Role::from_claim(" ADMIN "), Role::Admin);
        assert_eq!(Role::from_claim("user"), Role::Customer);
        assert_eq!(Role::from_claim("provider"), Role::Customer);
    }

    #[test]
    fn actor_from_context() {
        let actor = Actor::from_context(&StaticAuthContext::customer("u-1")).unwrap();
        assert_eq!(actor, Actor::Customer(CustomerId::from("u-1")));
        assert!(!actor.is_admin());

        let actor = Actor::from_context(&StaticAuthContext::admin("root")).unwrap();
        assert!(actor.is_admin());
        assert_eq!(actor.id().as_str(), "root");
    }

    #[test]
    fn anonymous_context_is_unauthenticated() {
        let err = Actor::from_context(&StaticAuthContext::anonymous()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[test]
    fn roster_decides_role() {
        let admins: HashSet<CustomerId> = [CustomerId::from("ops")].into_iter().collect();
        assert_eq!(StaticAuthContext::from_roster("ops", &admins).current_role(), Role::Admin);
        assert_eq!(StaticAuthContext::from_roster("u-2", &admins).current_role(), Role::Customer);
    }
}
