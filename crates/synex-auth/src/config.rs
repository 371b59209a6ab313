//! Authentication and permission-engine configuration.

use serde::Deserialize;

/// Token issuance and verification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 900,
            jwt_issuer: "synex".into(),
        }
    }
}

/// Capabilities of the permission engine, fixed at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    /// Whether per-user GRANT/DENY overrides are stored and evaluated.
    /// When off, evaluation is role-only and override writes are rejected.
    pub overrides_enabled: bool,
    /// Whether holders of an `admin_roles` role pass every guard check
    /// not blocked by a DENY override.
    pub admin_bypass: bool,
    /// Role names granting the admin bypass, compared case-insensitively.
    pub admin_roles: Vec<String>,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            overrides_enabled: true,
            admin_bypass: false,
            admin_roles: vec!["ADMIN".into(), "SUPER_ADMIN".into()],
        }
    }
}

impl PermissionConfig {
    pub fn is_admin_role(&self, role_name: &str) -> bool {
        self.admin_roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(role_name.trim()))
    }
}
