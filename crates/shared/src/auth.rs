//! Authentication claims carried by access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RoleId, TenantId, UserId};

/// JWT claims for access tokens.
///
/// User and role ids are kept as raw integers: a token minted by another
/// service may carry a non-positive id, and the visibility engine treats
/// such ids as "no access" rather than rejecting the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i64,
    /// Tenant the user is acting in.
    pub tenant: TenantId,
    /// User's role within the tenant.
    pub role_id: i64,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: i64, tenant: TenantId, role_id: i64, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            tenant,
            role_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the validated user ID, if the subject is a positive integer.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        UserId::new(self.sub)
    }

    /// Returns the validated role ID, if present and positive.
    #[must_use]
    pub const fn role(&self) -> Option<RoleId> {
        RoleId::new(self.role_id)
    }

    /// Returns the tenant ID from claims.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant
    }
}
