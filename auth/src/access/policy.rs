use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use super::context::SecurityContext;
use crate::principal::Role;

/// What a matching request must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Anyone, including anonymous callers.
    Public,
    /// Any authenticated principal.
    Authenticated,
    /// An authenticated principal holding the given role.
    HasRole(Role),
}

/// Request path pattern.
///
/// * `/login` matches exactly that path
/// * `/admin/**` matches `/admin` and every path below it
/// * `/**` matches everything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
    Any,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PathPatternError> {
        if !pattern.starts_with('/') {
            return Err(PathPatternError(pattern.to_string()));
        }

        if pattern == "/**" {
            return Ok(PathPattern::Any);
        }

        match pattern.strip_suffix("/**") {
            Some(prefix) if prefix.contains('*') => Err(PathPatternError(pattern.to_string())),
            Some(prefix) => Ok(PathPattern::Prefix(prefix.to_string())),
            None if pattern.contains('*') => Err(PathPatternError(pattern.to_string())),
            None => Ok(PathPattern::Exact(normalize(pattern).to_string())),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            PathPattern::Any => true,
        }
    }

    /// Ordering key: higher is more specific.
    fn specificity(&self) -> (u8, usize) {
        match self {
            PathPattern::Exact(exact) => (2, exact.len()),
            PathPattern::Prefix(prefix) => (1, prefix.len()),
            PathPattern::Any => (0, 0),
        }
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Exact(exact) => f.write_str(exact),
            PathPattern::Prefix(prefix) => write!(f, "{}/**", prefix),
            PathPattern::Any => f.write_str("/**"),
        }
    }
}

impl FromStr for PathPattern {
    type Err = PathPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        PathPattern::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid path pattern: {0} (expected /exact, /prefix/** or /**)")]
pub struct PathPatternError(pub String);

/// One entry of the authorization rule set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizationRule {
    pub pattern: PathPattern,
    pub access: Access,
}

impl AuthorizationRule {
    pub fn new(pattern: PathPattern, access: Access) -> Self {
        Self { pattern, access }
    }
}

/// Outcome of evaluating a request against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// No authenticated principal where one is required.
    Unauthenticated,
    /// Authenticated, but missing the required role.
    Forbidden(Role),
}

/// Path-based authorization rules, loaded once at startup.
///
/// The most specific matching rule decides; among equally specific rules the
/// first declared wins. Paths matched by no rule require authentication.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationPolicy {
    rules: Vec<AuthorizationRule>,
}

impl AuthorizationPolicy {
    pub fn new(rules: Vec<AuthorizationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AuthorizationRule] {
        &self.rules
    }

    /// The access rule governing `path`.
    pub fn access_for(&self, path: &str) -> Access {
        let mut selected: Option<&AuthorizationRule> = None;
        for rule in self.rules.iter().filter(|rule| rule.pattern.matches(path)) {
            let more_specific = selected
                .map_or(true, |current| rule.pattern.specificity() > current.pattern.specificity());
            if more_specific {
                selected = Some(rule);
            }
        }

        selected.map_or(Access::Authenticated, |rule| rule.access)
    }

    pub fn evaluate(&self, path: &str, context: &SecurityContext) -> Decision {
        match self.access_for(path) {
            Access::Public => Decision::Allow,
            _ if !context.is_authenticated() => Decision::Unauthenticated,
            Access::Authenticated => Decision::Allow,
            Access::HasRole(role) if context.has_role(role) => Decision::Allow,
            Access::HasRole(role) => Decision::Forbidden(role),
        }
    }
}
