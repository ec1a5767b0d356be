//! Error taxonomy for the ingestion pipeline.

use thiserror::Error;

use crate::catalog::CatalogError;

use super::validate::ValidationError;

/// Everything that can go wrong between receiving an ingestion request and
/// committing the catalog replacement.
///
/// Every variant is an expected failure recovered at the HTTP boundary;
/// nothing here propagates as a panic.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Neither a URL nor an uploaded file was supplied.
    #[error("missing arguments - provide url or file")]
    MissingSource,

    /// The supplied URL is not syntactically valid (or not http/https).
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The remote endpoint could not be reached, timed out, or answered
    /// with a non-success status.
    #[error("feed fetch failed: {0}")]
    Fetch(String),

    /// Neither the MIME hint nor the extension named a supported format.
    #[error("unrecognized format: {0}")]
    UnrecognizedFormat(String),

    /// The document failed to decode in the detected format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The decoded document violated the feed contract.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The requesting principal is not a shop account.
    #[error("only shop accounts may update a catalog")]
    NotShopAccount,

    /// The catalog replacement failed (ownership mismatch or storage error).
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
