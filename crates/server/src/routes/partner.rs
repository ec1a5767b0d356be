//! Partner feed route handlers.
//!
//! One endpoint: `POST /partner/update`. Partners either upload the feed as
//! a multipart file or point the service at a URL (multipart `url` field or
//! a JSON body). The handler only shapes the transport; everything else
//! lives in the ingestion pipeline.

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::ingest::FeedSource;
use crate::middleware::auth::RequireShopAccount;
use crate::state::AppState;

/// JSON request body for URL-mode updates.
#[derive(Debug, Deserialize)]
pub struct PartnerUpdateRequest {
    pub url: Option<String>,
}

/// Load a partner's price feed and replace their catalog with it.
#[instrument(skip_all, fields(principal = %principal.id))]
pub async fn update_catalog(
    State(state): State<AppState>,
    RequireShopAccount(principal): RequireShopAccount,
    request: Request,
) -> Result<Response> {
    let source = extract_source(&state, request).await?;
    let summary = state.ingestor().ingest(source, &principal).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "Status": true,
            "categories": summary.categories,
            "products": summary.products,
        })),
    )
        .into_response())
}

/// Pull the feed source out of the request body.
///
/// Multipart bodies may carry a `file` field (upload mode) and/or a `url`
/// field; an uploaded file wins when both are present. Anything else is
/// treated as a JSON body with an optional `url`. Returning `None` lets the
/// pipeline report the canonical missing-arguments error.
async fn extract_source(state: &AppState, request: Request) -> Result<Option<FeedSource>> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(bad_request)?;

        let mut url = None;
        let mut file = None;
        while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    let filename = field.file_name().unwrap_or("feed").to_owned();
                    let bytes = field.bytes().await.map_err(bad_request)?;
                    file = Some(FeedSource::Upload {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                Some("url") => url = Some(field.text().await.map_err(bad_request)?),
                _ => {} // unknown fields ignored
            }
        }

        Ok(file.or_else(|| {
            url.filter(|value| !value.is_empty())
                .map(FeedSource::Url)
        }))
    } else if content_type.is_empty() {
        Ok(None)
    } else {
        let Json(body) = Json::<PartnerUpdateRequest>::from_request(request, state)
            .await
            .map_err(bad_request)?;
        Ok(body
            .url
            .filter(|value| !value.is_empty())
            .map(FeedSource::Url))
    }
}

fn bad_request<E: std::fmt::Display>(err: E) -> AppError {
    AppError::BadRequest(err.to_string())
}
