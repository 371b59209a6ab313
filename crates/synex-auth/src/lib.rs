//! Synex Auth: permission administration, effective-permission
//! resolution, request authorization and JWT claims.

pub mod admin;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod guard;
pub mod resolver;
pub mod token;

pub use admin::{AdministrationService, UserPermissions};
pub use catalog::{CatalogService, SeedReport};
pub use config::{AuthConfig, PermissionConfig};
pub use directory::DirectoryService;
pub use error::AuthError;
pub use guard::{Authorizer, Decision};
pub use resolver::PermissionResolver;
pub use token::{AccessTokenClaims, PermissionHint, TokenSubject};
