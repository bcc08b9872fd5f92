use crate::principal::Principal;
use crate::principal::Role;

/// Request-scoped record of who is calling.
///
/// A fresh context is built for every request; nothing carries over between
/// requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    principal: Option<Principal>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|principal| principal.has_role(role))
    }
}
