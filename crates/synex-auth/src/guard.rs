//! Request authorization guard.
//!
//! Turns a live permission check into an allow/deny decision. Errors never
//! leak to the caller: they are logged and collapse to [`Decision::Denied`].

use synex_core::error::SynexResult;
use synex_core::evaluation::PermissionQuery;
use synex_core::repository::PermissionStore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::resolver::PermissionResolver;
use crate::token::{AccessTokenClaims, decode_access_token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allowed
    }

    /// `Err(AccessDenied)` unless allowed.
    pub fn require(self) -> Result<(), AuthError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied => Err(AuthError::AccessDenied),
        }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allowed
        } else {
            Decision::Denied
        }
    }
}

pub struct Authorizer<S: PermissionStore> {
    resolver: PermissionResolver<S>,
    auth: AuthConfig,
}

impl<S: PermissionStore> Authorizer<S> {
    pub fn new(resolver: PermissionResolver<S>, auth: AuthConfig) -> Self {
        Self { resolver, auth }
    }

    pub fn resolver(&self) -> &PermissionResolver<S> {
        &self.resolver
    }

    /// Verify a bearer token, then authorize its subject.
    pub async fn authorize_bearer(&self, token: &str, query: &PermissionQuery) -> Decision {
        match decode_access_token(token, &self.auth) {
            Ok(claims) => self.authorize(&claims, query).await,
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                Decision::Denied
            }
        }
    }

    /// Authorize the token's subject for one check. The permission hints
    /// carried by the claims are ignored.
    pub async fn authorize(&self, claims: &AccessTokenClaims, query: &PermissionQuery) -> Decision {
        let user_id = match claims.user_id() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Malformed token subject");
                return Decision::Denied;
            }
        };

        match self.check(user_id, query).await {
            Ok(allowed) => {
                debug!(%user_id, permission = %query.canonical_name(), allowed, "Access decision");
                Decision::from(allowed)
            }
            Err(e) => {
                warn!(
                    %user_id,
                    permission = %query.canonical_name(),
                    error = %e,
                    "Permission check failed; denying"
                );
                Decision::Denied
            }
        }
    }

    /// Allowed when any of the checks passes. An empty list is denied.
    pub async fn authorize_any(
        &self,
        claims: &AccessTokenClaims,
        queries: &[PermissionQuery],
    ) -> Decision {
        for query in queries {
            if self.authorize(claims, query).await.is_allowed() {
                return Decision::Allowed;
            }
        }
        Decision::Denied
    }

    /// Allowed when every check passes. An empty list is denied.
    pub async fn authorize_all(
        &self,
        claims: &AccessTokenClaims,
        queries: &[PermissionQuery],
    ) -> Decision {
        if queries.is_empty() {
            return Decision::Denied;
        }
        for query in queries {
            if !self.authorize(claims, query).await.is_allowed() {
                return Decision::Denied;
            }
        }
        Decision::Allowed
    }

    /// Resolver result, widened by the admin bypass unless a DENY applies.
    async fn check(&self, user_id: Uuid, query: &PermissionQuery) -> SynexResult<bool> {
        let evaluation = self.resolver.evaluate(user_id, query).await?;
        if evaluation.allows() {
            return Ok(true);
        }
        if evaluation.direct_deny || !query.is_well_formed() {
            return Ok(false);
        }
        self.resolver.is_admin(user_id).await
    }
}
