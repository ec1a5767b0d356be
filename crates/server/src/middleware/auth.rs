//! Principal extraction for partner endpoints.
//!
//! Authentication itself happens upstream; the gateway strips any
//! client-supplied principal headers and forwards the verified identity as
//! `x-principal-id` and `x-principal-type`. This module turns those headers
//! into a [`Principal`] and enforces the shop-account requirement.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use feedbridge_core::{Principal, PrincipalId, PrincipalKind};

use crate::error::StatusBody;

/// Header carrying the authenticated principal's id.
pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";

/// Header carrying the authenticated principal's account kind.
pub const PRINCIPAL_TYPE_HEADER: &str = "x-principal-type";

/// Extractor that requires an authenticated shop account.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     RequireShopAccount(principal): RequireShopAccount,
/// ) -> impl IntoResponse {
///     format!("hello, shop {}", principal.id)
/// }
/// ```
pub struct RequireShopAccount(pub Principal);

/// Rejection returned when the shop-account requirement is not met.
pub enum AuthRejection {
    /// No valid principal headers - the request never passed the gateway.
    Unauthenticated,
    /// The principal is valid but not a shop account.
    NotShop,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "authentication required"),
            Self::NotShop => (
                StatusCode::FORBIDDEN,
                "only shop accounts may update a catalog",
            ),
        };
        (status, Json(StatusBody::error(message))).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireShopAccount
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts).ok_or(AuthRejection::Unauthenticated)?;
        if !principal.is_shop() {
            return Err(AuthRejection::NotShop);
        }
        Ok(Self(principal))
    }
}

/// Read the gateway-injected principal headers, if both are present and
/// well-formed.
fn principal_from_parts(parts: &Parts) -> Option<Principal> {
    let id = parts
        .headers
        .get(PRINCIPAL_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;
    let kind = parts
        .headers
        .get(PRINCIPAL_TYPE_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<PrincipalKind>()
        .ok()?;
    Some(Principal::new(PrincipalId::new(id), kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/partner/update");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).expect("request").into_parts();
        parts
    }

    #[test]
    fn test_principal_from_valid_headers() {
        let parts = parts(&[
            (PRINCIPAL_ID_HEADER, "42"),
            (PRINCIPAL_TYPE_HEADER, "shop"),
        ]);
        let principal = principal_from_parts(&parts).expect("principal");
        assert_eq!(principal.id, PrincipalId::new(42));
        assert!(principal.is_shop());
    }

    #[test]
    fn test_missing_headers_yield_none() {
        assert!(principal_from_parts(&parts(&[])).is_none());
        assert!(principal_from_parts(&parts(&[(PRINCIPAL_ID_HEADER, "42")])).is_none());
        assert!(principal_from_parts(&parts(&[(PRINCIPAL_TYPE_HEADER, "shop")])).is_none());
    }

    #[test]
    fn test_malformed_headers_yield_none() {
        assert!(
            principal_from_parts(&parts(&[
                (PRINCIPAL_ID_HEADER, "not-a-number"),
                (PRINCIPAL_TYPE_HEADER, "shop"),
            ]))
            .is_none()
        );
        assert!(
            principal_from_parts(&parts(&[
                (PRINCIPAL_ID_HEADER, "42"),
                (PRINCIPAL_TYPE_HEADER, "admin"),
            ]))
            .is_none()
        );
    }

    #[tokio::test]
    async fn test_buyer_is_rejected_as_not_shop() {
        let mut parts = parts(&[
            (PRINCIPAL_ID_HEADER, "7"),
            (PRINCIPAL_TYPE_HEADER, "buyer"),
        ]);
        let rejection = RequireShopAccount::from_request_parts(&mut parts, &())
            .await
            .map(|_| ())
            .expect_err("should reject");
        assert!(matches!(rejection, AuthRejection::NotShop));
    }
}
