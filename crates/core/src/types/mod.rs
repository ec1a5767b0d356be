//! Core types for Feedbridge.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod principal;

pub use id::*;
pub use principal::{Principal, PrincipalKind, UnknownPrincipalKind};
