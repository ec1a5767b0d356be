//! In-memory catalog backend.
//!
//! Mirrors the transactional semantics of the `PostgreSQL` backend: each
//! replacement is applied to a copy of the state and the live state is only
//! swapped once every step has succeeded, so a failure mid-replacement
//! leaves the catalog exactly as it was. Backs the pipeline tests and local
//! development without a database.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use rust_decimal::Decimal;

use feedbridge_core::PrincipalId;

use crate::ingest::validate::PriceFeed;

use super::{CatalogError, CatalogWriter, ReplaceSummary};

/// The complete persisted state, keyed by the unique names the schema keys
/// on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub shops: BTreeMap<String, ShopRecord>,
    pub categories: BTreeMap<String, CategoryRecord>,
    pub products: BTreeMap<String, ProductRecord>,
    pub product_infos: Vec<ProductInfoRecord>,
    pub parameter_names: BTreeSet<String>,
}

impl CatalogSnapshot {
    /// Product info rows belonging to one shop.
    pub fn shop_catalog(&self, shop: &str) -> Vec<&ProductInfoRecord> {
        self.product_infos
            .iter()
            .filter(|info| info.shop == shop)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopRecord {
    pub owner: PrincipalId,
    pub accepts_orders: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRecord {
    /// Names of the shops this category is offered at.
    pub shops: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    /// Category the product was first created under.
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductInfoRecord {
    pub shop: String,
    pub product: String,
    pub external_id: Option<i64>,
    pub quantity: i64,
    pub price: Decimal,
    pub price_rrc: Decimal,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: CatalogSnapshot,
    replace_calls: usize,
    fail_after_products: Option<usize>,
}

/// In-memory [`CatalogWriter`] with the same replacement semantics as
/// [`super::PgCatalog`].
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<Inner>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.lock().snapshot.clone()
    }

    /// How many times `replace_catalog` has been invoked, successful or not.
    #[must_use]
    pub fn replace_calls(&self) -> usize {
        self.lock().replace_calls
    }

    /// Make the next replacements fail after `count` product inserts,
    /// simulating a constraint violation partway through the sweep.
    pub fn fail_after_products(&self, count: usize) {
        self.lock().fail_after_products = Some(count);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CatalogWriter for MemoryCatalog {
    async fn replace_catalog(
        &self,
        feed: &PriceFeed,
        owner: PrincipalId,
    ) -> Result<ReplaceSummary, CatalogError> {
        let mut inner = self.lock();
        inner.replace_calls += 1;
        let fail_after = inner.fail_after_products;

        // Work on a copy; the live snapshot is only replaced once every
        // step has succeeded.
        let mut next = inner.snapshot.clone();

        match next.shops.get(&feed.shop) {
            Some(shop) if shop.owner != owner => return Err(CatalogError::ShopNotOwned),
            Some(_) => {}
            None => {
                next.shops.insert(
                    feed.shop.clone(),
                    ShopRecord {
                        owner,
                        accepts_orders: true,
                    },
                );
            }
        }

        for name in &feed.categories {
            next.categories
                .entry(name.clone())
                .or_default()
                .shops
                .insert(feed.shop.clone());
        }

        // Full snapshot sync: the previous catalog for this shop goes away
        // (parameters live inside the rows, so they go with it).
        next.product_infos.retain(|info| info.shop != feed.shop);

        for (index, item) in feed.goods.iter().enumerate() {
            if fail_after.is_some_and(|count| index >= count) {
                return Err(CatalogError::Storage(
                    "injected failure during product insert".to_owned(),
                ));
            }

            next.categories
                .entry(item.category.clone())
                .or_default()
                .shops
                .insert(feed.shop.clone());

            // Existing products are reused as-is, even when the feed names a
            // different category.
            next.products.entry(item.name.clone()).or_insert_with(|| ProductRecord {
                category: item.category.clone(),
            });

            for parameter in &item.parameters {
                next.parameter_names.insert(parameter.name.clone());
            }

            next.product_infos.push(ProductInfoRecord {
                shop: feed.shop.clone(),
                product: item.name.clone(),
                external_id: item.external_id,
                quantity: item.quantity,
                price: item.price,
                price_rrc: item.price_rrc,
                parameters: item
                    .parameters
                    .iter()
                    .map(|p| (p.name.clone(), p.value.clone()))
                    .collect(),
            });
        }

        inner.snapshot = next;

        Ok(ReplaceSummary {
            categories: feed.categories.len(),
            products: feed.goods.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::validate::{FeedItem, FeedParameter};

    fn owner_a() -> PrincipalId {
        PrincipalId::new(1)
    }

    fn owner_b() -> PrincipalId {
        PrincipalId::new(2)
    }

    fn item(name: &str, category: &str) -> FeedItem {
        FeedItem {
            name: name.to_owned(),
            category: category.to_owned(),
            external_id: None,
            price: Decimal::new(1050, 2),
            price_rrc: Decimal::new(1200, 2),
            quantity: 3,
            parameters: vec![FeedParameter {
                name: "color".to_owned(),
                value: "black".to_owned(),
            }],
        }
    }

    fn feed(shop: &str, goods: Vec<FeedItem>) -> PriceFeed {
        PriceFeed {
            shop: shop.to_owned(),
            categories: vec!["C1".to_owned()],
            goods,
        }
    }

    #[tokio::test]
    async fn test_first_feed_creates_everything() {
        let catalog = MemoryCatalog::new();
        catalog
            .replace_catalog(&feed("S1", vec![item("P1", "C2")]), owner_a())
            .await
            .expect("replace");

        let state = catalog.snapshot();
        assert_eq!(state.shops["S1"].owner, owner_a());
        assert!(state.shops["S1"].accepts_orders);
        // Declared category and the item's category are both offered.
        assert!(state.categories["C1"].shops.contains("S1"));
        assert!(state.categories["C2"].shops.contains("S1"));
        assert_eq!(state.products["P1"].category, "C2");
        assert_eq!(state.shop_catalog("S1").len(), 1);
        assert!(state.parameter_names.contains("color"));
    }

    #[tokio::test]
    async fn test_replacement_is_a_full_snapshot() {
        let catalog = MemoryCatalog::new();
        catalog
            .replace_catalog(&feed("S1", vec![item("P1", "C1"), item("P2", "C1")]), owner_a())
            .await
            .expect("first");
        catalog
            .replace_catalog(&feed("S1", vec![]), owner_a())
            .await
            .expect("second");

        let state = catalog.snapshot();
        assert!(state.shop_catalog("S1").is_empty());
        // Shared records survive the sweep.
        assert!(state.products.contains_key("P1"));
        assert!(state.categories.contains_key("C1"));
    }

    #[tokio::test]
    async fn test_other_shops_untouched() {
        let catalog = MemoryCatalog::new();
        catalog
            .replace_catalog(&feed("S1", vec![item("P1", "C1")]), owner_a())
            .await
            .expect("s1");
        catalog
            .replace_catalog(&feed("S2", vec![item("P2", "C1")]), owner_b())
            .await
            .expect("s2");
        catalog
            .replace_catalog(&feed("S1", vec![]), owner_a())
            .await
            .expect("s1 again");

        let state = catalog.snapshot();
        assert!(state.shop_catalog("S1").is_empty());
        assert_eq!(state.shop_catalog("S2").len(), 1);
    }

    #[tokio::test]
    async fn test_ownership_enforced() {
        let catalog = MemoryCatalog::new();
        catalog
            .replace_catalog(&feed("S1", vec![item("P1", "C1")]), owner_a())
            .await
            .expect("create");

        let err = catalog
            .replace_catalog(&feed("S1", vec![]), owner_b())
            .await
            .expect_err("should be forbidden");
        assert!(matches!(err, CatalogError::ShopNotOwned));

        // Nothing changed.
        assert_eq!(catalog.snapshot().shop_catalog("S1").len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_rolls_back() {
        let catalog = MemoryCatalog::new();
        catalog
            .replace_catalog(&feed("S1", vec![item("P1", "C1"), item("P2", "C1")]), owner_a())
            .await
            .expect("seed");

        catalog.fail_after_products(1);
        let err = catalog
            .replace_catalog(
                &feed("S1", vec![item("P3", "C1"), item("P4", "C1")]),
                owner_a(),
            )
            .await
            .expect_err("should fail");
        assert!(matches!(err, CatalogError::Storage(_)));

        // The catalog is exactly as it was before the failed call.
        let names: Vec<_> = catalog
            .snapshot()
            .shop_catalog("S1")
            .iter()
            .map(|info| info.product.clone())
            .collect();
        assert_eq!(names, vec!["P1", "P2"]);
    }
}
