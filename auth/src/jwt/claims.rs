use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::principal::Principal;
use crate::principal::Role;

/// Claims carried by an access token.
///
/// `sub` is the username; `iat` and `exp` are Unix timestamps in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Roles held by the subject when the token was issued
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Claims {
    /// Create claims for a principal issued at `now` and valid for `ttl`.
    ///
    /// Returns `None` when `now + ttl` is outside the representable range.
    pub fn for_principal(principal: &Principal, now: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let expires_at = now.checked_add_signed(ttl)?;

        Some(Self {
            sub: principal.username.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            roles: principal.roles.iter().copied().collect(),
        })
    }

    /// Check if the token is expired at `now`.
    ///
    /// A token is still valid at exactly its expiration instant; any later
    /// instant, including a fraction of a second later, is expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let seconds = now.timestamp();
        seconds > self.exp || (seconds == self.exp && now.timestamp_subsec_nanos() > 0)
    }

    /// Rebuild the principal the token was issued for.
    pub fn principal(&self) -> Principal {
        Principal::new(self.sub.clone(), self.roles.iter().copied())
    }
}
