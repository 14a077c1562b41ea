//! Access token claims shared between the auth service (issuer) and the API
//! service (verifier)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to superusers; lets them edit any recipe
pub const SUPERUSER_ROLE: &str = "superuser";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Token ID, the handle used to revoke the token on logout
    pub jti: Uuid,
    /// User roles
    pub roles: Vec<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

impl Claims {
    pub fn is_superuser(&self) -> bool {
        self.roles.iter().any(|r| r == SUPERUSER_ROLE)
    }

    /// Seconds the token still has to live at `now`
    pub fn remaining_lifetime(&self, now: u64) -> u64 {
        self.exp.saturating_sub(now)
    }
}

/// Pull the raw token out of an `Authorization` header value
///
/// Accepts both `Token <t>` (what the web client sends) and `Bearer <t>`.
pub fn extract_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Token ")
        .or_else(|| header_value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
