//! Effective-permission resolver.
//!
//! Loads a user's role bindings and (when enabled) direct overrides and
//! hands them to [`synex_core::evaluation`]. Nothing is cached; every call
//! reads the store.

use chrono::Utc;
use synex_core::error::{SynexError, SynexResult};
use synex_core::evaluation::{self, PermissionEvaluation, PermissionQuery};
use synex_core::models::permission::Permission;
use synex_core::models::user_permission::UserPermissionOverride;
use synex_core::repository::{
    PermissionStore, RolePermissionRepository, RoleRepository, UserPermissionRepository,
    UserRepository,
};
use tracing::debug;
use uuid::Uuid;

use crate::config::PermissionConfig;
use crate::token::TokenSubject;

pub struct PermissionResolver<S: PermissionStore> {
    store: S,
    config: PermissionConfig,
}

impl<S: PermissionStore> PermissionResolver<S> {
    pub fn new(store: S, config: PermissionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PermissionConfig {
        &self.config
    }

    /// `(role-granted OR direct GRANT) AND NOT direct DENY`.
    ///
    /// A blank module or action, or an unknown user, yields `false`.
    pub async fn has_permission(&self, user_id: Uuid, query: &PermissionQuery) -> SynexResult<bool> {
        Ok(self.evaluate(user_id, query).await?.allows())
    }

    /// The three sources behind [`Self::has_permission`].
    pub async fn evaluate(
        &self,
        user_id: Uuid,
        query: &PermissionQuery,
    ) -> SynexResult<PermissionEvaluation> {
        if !query.is_well_formed() {
            return Ok(PermissionEvaluation::default());
        }
        match self.store.users().get_by_id(user_id).await {
            Ok(_) => {}
            Err(SynexError::NotFound { .. }) => return Ok(PermissionEvaluation::default()),
            Err(e) => return Err(e),
        }

        let bindings = self.store.role_bindings().list_for_user(user_id).await?;
        let overrides = self.overrides_for(user_id).await?;
        let result = evaluation::evaluate(query, &bindings, &overrides, Utc::now());

        debug!(
            %user_id,
            permission = %query.canonical_name(),
            role_granted = result.role_granted,
            direct_grant = result.direct_grant,
            direct_deny = result.direct_deny,
            "Permission evaluated"
        );
        Ok(result)
    }

    /// `(role-derived ∪ direct GRANT) − direct DENY`, ordered by
    /// `(module, action)`.
    pub async fn effective_permissions(&self, user_id: Uuid) -> SynexResult<Vec<Permission>> {
        self.store.users().get_by_id(user_id).await?;
        let bindings = self.store.role_bindings().list_for_user(user_id).await?;
        let overrides = self.overrides_for(user_id).await?;
        Ok(evaluation::effective_permissions(
            &bindings,
            &overrides,
            Utc::now(),
        ))
    }

    /// Whether the user holds a role named in `admin_roles`. Always false
    /// unless the admin bypass is enabled.
    pub async fn is_admin(&self, user_id: Uuid) -> SynexResult<bool> {
        if !self.config.admin_bypass {
            return Ok(false);
        }
        let roles = self.store.roles().get_user_roles(user_id).await?;
        Ok(roles.iter().any(|r| self.config.is_admin_role(&r.name)))
    }

    /// Snapshot of identity, roles and effective permissions for token
    /// issuance.
    pub async fn token_subject(&self, user_id: Uuid) -> SynexResult<TokenSubject> {
        let user = self.store.users().get_by_id(user_id).await?;
        let roles = self.store.roles().get_user_roles(user_id).await?;
        let permissions = self.effective_permissions(user_id).await?;
        Ok(TokenSubject::new(&user, &roles, &permissions))
    }

    async fn overrides_for(&self, user_id: Uuid) -> SynexResult<Vec<UserPermissionOverride>> {
        if !self.config.overrides_enabled {
            return Ok(Vec::new());
        }
        self.store.overrides().list_for_user(user_id).await
    }
}
