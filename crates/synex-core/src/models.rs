//! Domain models for Synex.
//!
//! These are the core types shared across all crates.

pub mod binding;
pub mod permission;
pub mod permission_group;
pub mod role;
pub mod user;
pub mod user_permission;
