//! Catalog storage layer.
//!
//! The ingestion pipeline talks to storage through the [`CatalogWriter`]
//! seam: one operation that atomically replaces a shop's catalog with the
//! snapshot a validated feed describes. [`PgCatalog`] is the production
//! backend; [`MemoryCatalog`] carries the same semantics for tests and for
//! running the pipeline without a database.

use std::future::Future;

use thiserror::Error;

use feedbridge_core::PrincipalId;

use crate::ingest::validate::PriceFeed;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

/// Errors from the catalog storage layer.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The feed names a shop that belongs to a different principal.
    #[error("shop not owned by requesting account")]
    ShopNotOwned,

    /// Database operation failed; the transaction was rolled back.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database backend failure (in-memory backend only).
    #[error("storage error: {0}")]
    Storage(String),
}

/// What a completed replacement wrote, for logging and the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReplaceSummary {
    /// Categories declared at the feed's top level.
    pub categories: usize,
    /// Product info rows written for the shop.
    pub products: usize,
}

/// Transactional catalog replacement.
///
/// Implementations must be all-or-nothing: on any error the shop's catalog
/// is left exactly as it was before the call, and a partially replaced
/// catalog must never be observable - not even to concurrent readers.
pub trait CatalogWriter: Send + Sync {
    /// Replace the catalog of the shop named by `feed`.
    ///
    /// Looks up or creates the shop (first writer becomes the owner),
    /// rejects the call with [`CatalogError::ShopNotOwned`] when the shop
    /// belongs to someone else, then swaps the shop's entire product info
    /// set for the feed's contents. Categories, products, and parameter
    /// names are shared get-or-create records and are never deleted.
    fn replace_catalog(
        &self,
        feed: &PriceFeed,
        owner: PrincipalId,
    ) -> impl Future<Output = Result<ReplaceSummary, CatalogError>> + Send;
}
