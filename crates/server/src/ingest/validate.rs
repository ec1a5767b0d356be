//! Deep structural validation of decoded partner feeds.
//!
//! Validation is fully separated from mutation: a feed that fails any rule
//! here never touches storage. The walk is fail-fast - it returns on the
//! first violation rather than accumulating errors - and produces the typed
//! document the catalog engine consumes.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use feedbridge_core::coerce;

/// A feed that passed validation: the complete snapshot of one shop's
/// catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFeed {
    /// Shop name the snapshot belongs to.
    pub shop: String,
    /// Category names declared at the top level.
    pub categories: Vec<String>,
    /// Catalog entries.
    pub goods: Vec<FeedItem>,
}

/// One catalog entry of a validated feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub name: String,
    pub category: String,
    /// Partner-side identifier; optional and unvalidated beyond coercion.
    pub external_id: Option<i64>,
    pub price: Decimal,
    /// Recommended retail price.
    pub price_rrc: Decimal,
    pub quantity: i64,
    pub parameters: Vec<FeedParameter>,
}

/// A (name, value) pair attached to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedParameter {
    pub name: String,
    pub value: String,
}

/// First violation found while walking a decoded feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("root must be an object")]
    RootNotObject,

    #[error("missing/invalid shop name")]
    MissingShopName,

    #[error("categories must be a list of objects")]
    CategoriesNotList,

    #[error("invalid category at position {position}")]
    InvalidCategory { position: usize },

    #[error("goods must be a list of objects")]
    GoodsNotList,

    #[error("goods entry {position} must be an object")]
    GoodsEntryNotObject { position: usize },

    #[error("invalid product info for {name}")]
    InvalidProductInfo { name: String },

    #[error("duplicate product name {name}")]
    DuplicateProductName { name: String },

    #[error("parameters for {product} must be a list of name/value objects")]
    ParametersNotList { product: String },

    #[error("invalid parameter for {product}")]
    InvalidParameter { product: String },

    #[error("duplicate parameter {name} for {product}")]
    DuplicateParameter { product: String, name: String },
}

/// Walk a decoded feed top-to-bottom and extract the typed document.
///
/// Unknown fields (including the legacy `version` marker) are ignored for
/// forward compatibility.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_feed(tree: &Value) -> Result<PriceFeed, ValidationError> {
    let root = tree.as_object().ok_or(ValidationError::RootNotObject)?;

    let shop = root
        .get("shop")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(ValidationError::MissingShopName)?
        .to_owned();

    let categories = validate_categories(root.get("categories"))?;
    let goods = validate_goods(root.get("goods"))?;

    Ok(PriceFeed {
        shop,
        categories,
        goods,
    })
}

fn validate_categories(value: Option<&Value>) -> Result<Vec<String>, ValidationError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let list = value.as_array().ok_or(ValidationError::CategoriesNotList)?;

    let mut categories = Vec::with_capacity(list.len());
    for (position, entry) in list.iter().enumerate() {
        let name = entry
            .as_object()
            .and_then(|map| map.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or(ValidationError::InvalidCategory { position })?;
        categories.push(name.to_owned());
    }
    Ok(categories)
}

fn validate_goods(value: Option<&Value>) -> Result<Vec<FeedItem>, ValidationError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let list = value.as_array().ok_or(ValidationError::GoodsNotList)?;

    let mut goods = Vec::with_capacity(list.len());
    let mut names: HashSet<&str> = HashSet::with_capacity(list.len());
    for (position, entry) in list.iter().enumerate() {
        let item = entry
            .as_object()
            .ok_or(ValidationError::GoodsEntryNotObject { position })?;

        let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
        let category = item
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let price = item.get("price").and_then(coerce::to_positive_decimal);
        let price_rrc = item.get("price_rrc").and_then(coerce::to_positive_decimal);
        let quantity = item.get("quantity").and_then(coerce::to_positive_int);

        let (Some(price), Some(price_rrc), Some(quantity)) = (price, price_rrc, quantity) else {
            return Err(ValidationError::InvalidProductInfo {
                name: name.to_owned(),
            });
        };
        if name.is_empty() || category.is_empty() {
            return Err(ValidationError::InvalidProductInfo {
                name: name.to_owned(),
            });
        }
        if !names.insert(name) {
            return Err(ValidationError::DuplicateProductName {
                name: name.to_owned(),
            });
        }

        // A malformed external id degrades to NULL rather than failing the
        // feed; the field is optional and partner-defined.
        let external_id = item.get("id").and_then(coerce::to_positive_int);

        let parameters = validate_parameters(item.get("parameters"), name)?;

        goods.push(FeedItem {
            name: name.to_owned(),
            category: category.to_owned(),
            external_id,
            price,
            price_rrc,
            quantity,
            parameters,
        });
    }
    Ok(goods)
}

fn validate_parameters(
    value: Option<&Value>,
    product: &str,
) -> Result<Vec<FeedParameter>, ValidationError> {
    // An explicit null is treated the same as an absent key.
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(Vec::new());
    };
    let list = value.as_array().ok_or_else(|| ValidationError::ParametersNotList {
        product: product.to_owned(),
    })?;

    let mut parameters = Vec::with_capacity(list.len());
    let mut seen: HashSet<&str> = HashSet::with_capacity(list.len());
    for entry in list {
        let map = entry.as_object().ok_or_else(|| ValidationError::InvalidParameter {
            product: product.to_owned(),
        })?;
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ValidationError::InvalidParameter {
                product: product.to_owned(),
            })?;
        let value = map
            .get("value")
            .filter(|v| !v.is_null())
            .ok_or_else(|| ValidationError::InvalidParameter {
                product: product.to_owned(),
            })?;
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateParameter {
                product: product.to_owned(),
                name: name.to_owned(),
            });
        }
        parameters.push(FeedParameter {
            name: name.to_owned(),
            value: parameter_value_text(value),
        });
    }
    Ok(parameters)
}

/// Stringify a parameter value: strings as-is, everything else as compact
/// JSON.
fn parameter_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_feed() -> Value {
        json!({
            "shop": "S1",
            "categories": [{"name": "C1"}, {"name": "C2"}],
            "goods": [
                {
                    "name": "P1",
                    "category": "C1",
                    "price": 10.5,
                    "price_rrc": 12,
                    "quantity": 3,
                    "id": 501,
                    "parameters": [
                        {"name": "color", "value": "black"},
                        {"name": "weight", "value": 2.5}
                    ]
                },
                {
                    "name": "P2",
                    "category": "C3",
                    "price": "4.99",
                    "price_rrc": "5.99",
                    "quantity": "7"
                }
            ]
        })
    }

    #[test]
    fn test_valid_feed_extracts_typed_document() {
        let feed = validate_feed(&sample_feed()).expect("valid");
        assert_eq!(feed.shop, "S1");
        assert_eq!(feed.categories, vec!["C1", "C2"]);
        assert_eq!(feed.goods.len(), 2);

        let first = &feed.goods[0];
        assert_eq!(first.name, "P1");
        assert_eq!(first.category, "C1");
        assert_eq!(first.external_id, Some(501));
        assert_eq!(first.quantity, 3);
        assert_eq!(first.parameters.len(), 2);
        assert_eq!(first.parameters[1].value, "2.5");

        // Numeric strings coerce like numbers.
        let second = &feed.goods[1];
        assert_eq!(second.quantity, 7);
        assert_eq!(second.external_id, None);
    }

    #[test]
    fn test_root_must_be_object() {
        let err = validate_feed(&json!(["not", "an", "object"])).expect_err("should fail");
        assert_eq!(err, ValidationError::RootNotObject);
        assert_eq!(err.to_string(), "root must be an object");
    }

    #[test]
    fn test_missing_shop_name() {
        let err = validate_feed(&json!({"goods": []})).expect_err("should fail");
        assert_eq!(err, ValidationError::MissingShopName);
        assert_eq!(err.to_string(), "missing/invalid shop name");

        let err = validate_feed(&json!({"shop": ""})).expect_err("should fail");
        assert_eq!(err, ValidationError::MissingShopName);

        let err = validate_feed(&json!({"shop": 5})).expect_err("should fail");
        assert_eq!(err, ValidationError::MissingShopName);
    }

    #[test]
    fn test_categories_shape() {
        let err = validate_feed(&json!({"shop": "S1", "categories": "C1"}))
            .expect_err("should fail");
        assert_eq!(err, ValidationError::CategoriesNotList);

        let err = validate_feed(&json!({"shop": "S1", "categories": [{"name": ""}]}))
            .expect_err("should fail");
        assert_eq!(err, ValidationError::InvalidCategory { position: 0 });

        let err = validate_feed(&json!({"shop": "S1", "categories": ["C1"]}))
            .expect_err("should fail");
        assert_eq!(err, ValidationError::InvalidCategory { position: 0 });
    }

    #[test]
    fn test_goods_must_be_list_of_objects() {
        let err = validate_feed(&json!({"shop": "S1", "goods": {}})).expect_err("should fail");
        assert_eq!(err, ValidationError::GoodsNotList);

        let err = validate_feed(&json!({"shop": "S1", "goods": ["P1"]})).expect_err("should fail");
        assert_eq!(err, ValidationError::GoodsEntryNotObject { position: 0 });
    }

    #[test]
    fn test_invalid_product_info() {
        // Missing quantity.
        let err = validate_feed(&json!({
            "shop": "S1",
            "goods": [{"name": "P1", "category": "C1", "price": 10, "price_rrc": 12}]
        }))
        .expect_err("should fail");
        assert_eq!(err, ValidationError::InvalidProductInfo { name: "P1".to_owned() });
        assert_eq!(err.to_string(), "invalid product info for P1");

        // Negative price.
        let err = validate_feed(&json!({
            "shop": "S1",
            "goods": [{"name": "P1", "category": "C1", "price": -1, "price_rrc": 12, "quantity": 3}]
        }))
        .expect_err("should fail");
        assert_eq!(err, ValidationError::InvalidProductInfo { name: "P1".to_owned() });

        // Missing category.
        let err = validate_feed(&json!({
            "shop": "S1",
            "goods": [{"name": "P1", "price": 10, "price_rrc": 12, "quantity": 3}]
        }))
        .expect_err("should fail");
        assert_eq!(err, ValidationError::InvalidProductInfo { name: "P1".to_owned() });
    }

    #[test]
    fn test_duplicate_product_name() {
        let item = json!({"name": "P1", "category": "C1", "price": 10, "price_rrc": 12, "quantity": 3});
        let err = validate_feed(&json!({"shop": "S1", "goods": [item.clone(), item]}))
            .expect_err("should fail");
        assert_eq!(err, ValidationError::DuplicateProductName { name: "P1".to_owned() });
        assert!(err.to_string().contains("P1"));
    }

    #[test]
    fn test_parameter_rules() {
        let base = |parameters: Value| {
            json!({
                "shop": "S1",
                "goods": [{
                    "name": "P1", "category": "C1",
                    "price": 10, "price_rrc": 12, "quantity": 3,
                    "parameters": parameters
                }]
            })
        };

        let err = validate_feed(&base(json!({"color": "black"}))).expect_err("should fail");
        assert_eq!(err, ValidationError::ParametersNotList { product: "P1".to_owned() });

        let err = validate_feed(&base(json!([{"name": "", "value": "x"}])))
            .expect_err("should fail");
        assert_eq!(err, ValidationError::InvalidParameter { product: "P1".to_owned() });

        let err = validate_feed(&base(json!([{"name": "color", "value": null}])))
            .expect_err("should fail");
        assert_eq!(err, ValidationError::InvalidParameter { product: "P1".to_owned() });

        let err = validate_feed(&base(json!([
            {"name": "color", "value": "black"},
            {"name": "color", "value": "white"}
        ])))
        .expect_err("should fail");
        assert_eq!(
            err,
            ValidationError::DuplicateParameter {
                product: "P1".to_owned(),
                name: "color".to_owned()
            }
        );

        // Explicit null parameters behave like an absent key.
        let feed = validate_feed(&base(json!(null))).expect("valid");
        assert!(feed.goods[0].parameters.is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let feed = validate_feed(&json!({
            "shop": "S1",
            "version": "v1.0",
            "generated_by": "partner-tool 3.2",
            "goods": []
        }))
        .expect("valid");
        assert_eq!(feed.shop, "S1");
        assert!(feed.goods.is_empty());
    }

    #[test]
    fn test_missing_optional_sections() {
        let feed = validate_feed(&json!({"shop": "S1"})).expect("valid");
        assert!(feed.categories.is_empty());
        assert!(feed.goods.is_empty());
    }
}
