//! The authenticated principal attached to each request.
//!
//! Account management lives in an upstream service; by the time a request
//! reaches Feedbridge the principal has already been authenticated and is
//! passed along as an id plus an account kind.

use serde::{Deserialize, Serialize};

use crate::types::id::PrincipalId;

/// The account kind of a principal.
///
/// Only [`PrincipalKind::Shop`] accounts may update a catalog; buyers consume
/// the read-side APIs that live outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Shop,
    Buyer,
}

impl PrincipalKind {
    /// The lowercase wire name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shop => "shop",
            Self::Buyer => "buyer",
        }
    }
}

impl std::str::FromStr for PrincipalKind {
    type Err = UnknownPrincipalKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shop" => Ok(Self::Shop),
            "buyer" => Ok(Self::Buyer),
            other => Err(UnknownPrincipalKind(other.to_owned())),
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a principal kind from its wire name.
#[derive(Debug, thiserror::Error)]
#[error("unknown principal kind: {0}")]
pub struct UnknownPrincipalKind(pub String);

/// An authenticated requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account id issued by the upstream account service.
    pub id: PrincipalId,
    /// Account kind.
    pub kind: PrincipalKind,
}

impl Principal {
    /// Create a new principal.
    #[must_use]
    pub const fn new(id: PrincipalId, kind: PrincipalKind) -> Self {
        Self { id, kind }
    }

    /// Whether this principal is a shop account.
    #[must_use]
    pub const fn is_shop(&self) -> bool {
        matches!(self.kind, PrincipalKind::Shop)
    }
}
