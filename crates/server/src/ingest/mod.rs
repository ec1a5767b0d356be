//! The partner feed ingestion pipeline.
//!
//! One entry point, [`Ingestor::ingest`], sequences the stages:
//! fetch → detect → decode → validate → replace. Every stage can
//! short-circuit with an [`IngestError`]; the HTTP layer turns those into
//! status codes and holds no pipeline logic of its own.

use tracing::instrument;

use feedbridge_core::Principal;

use crate::catalog::{CatalogWriter, ReplaceSummary};
use crate::config::IngestConfig;

pub mod detect;
pub mod error;
pub mod fetch;
pub mod validate;

pub use detect::FeedFormat;
pub use error::IngestError;
pub use fetch::{FeedFetcher, FeedSource, FetchedFeed};
pub use validate::{FeedItem, FeedParameter, PriceFeed, validate_feed};

/// The ingestion orchestrator.
///
/// Holds the fetcher and the catalog backend; configuration is passed in
/// explicitly at construction time rather than read from process-wide
/// state.
#[derive(Debug)]
pub struct Ingestor<C> {
    fetcher: FeedFetcher,
    catalog: C,
}

impl<C: CatalogWriter> Ingestor<C> {
    /// Build an orchestrator over the given catalog backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for remote fetches fails to
    /// build.
    pub fn new(config: &IngestConfig, catalog: C) -> Result<Self, reqwest::Error> {
        Ok(Self {
            fetcher: FeedFetcher::new(config)?,
            catalog,
        })
    }

    /// The catalog backend this orchestrator writes to.
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Ingest one partner feed and replace the shop's catalog with it.
    ///
    /// # Errors
    ///
    /// Returns an [`IngestError`] from whichever stage fails first; storage
    /// is only reached once the feed has fully validated.
    #[instrument(skip_all, fields(principal = %principal.id))]
    pub async fn ingest(
        &self,
        source: Option<FeedSource>,
        principal: &Principal,
    ) -> Result<ReplaceSummary, IngestError> {
        if !principal.is_shop() {
            return Err(IngestError::NotShopAccount);
        }
        let source = source.ok_or(IngestError::MissingSource)?;

        let fetched = self.fetcher.resolve(source).await?;
        let format = FeedFormat::detect(
            fetched.content_type.as_deref(),
            fetched.extension.as_deref(),
            &fetched.source,
        )?;
        let tree = format.decode(&fetched.bytes)?;
        let feed = validate_feed(&tree)?;

        let summary = self.catalog.replace_catalog(&feed, principal.id).await?;
        tracing::info!(
            shop = %feed.shop,
            format = %format,
            products = summary.products,
            "catalog replaced"
        );
        Ok(summary)
    }
}
