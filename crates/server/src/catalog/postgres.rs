//! `PostgreSQL` catalog backend.
//!
//! All queries are runtime-checked (`sqlx::query` rather than the macros) so
//! the crate builds without a live database. Get-or-create races on shared
//! names resolve through `INSERT ... ON CONFLICT (name) DO NOTHING` followed
//! by a re-select inside the same transaction.

use sqlx::{PgPool, Postgres, Transaction};

use feedbridge_core::{CategoryId, ParameterId, PrincipalId, ProductId, ProductInfoId, ShopId};

use crate::ingest::validate::{FeedItem, PriceFeed};

use super::{CatalogError, CatalogWriter, ReplaceSummary};

/// Catalog backend over `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Create a new catalog backend on the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogWriter for PgCatalog {
    async fn replace_catalog(
        &self,
        feed: &PriceFeed,
        owner: PrincipalId,
    ) -> Result<ReplaceSummary, CatalogError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent ingestions for the same shop serialize here, so two
        // overlapping delete-then-insert sweeps cannot interleave. The lock
        // is released at commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&feed.shop)
            .execute(&mut *tx)
            .await?;

        let shop_id = get_or_create_shop(&mut tx, &feed.shop, owner).await?;

        for name in &feed.categories {
            let category_id = get_or_create_category(&mut tx, name).await?;
            offer_category_at_shop(&mut tx, shop_id, category_id).await?;
        }

        // Full snapshot sync: drop the shop's previous catalog before
        // inserting the new one. Product parameters go with it via cascade.
        sqlx::query("DELETE FROM catalog.product_info WHERE shop_id = $1")
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;

        for item in &feed.goods {
            insert_product_info(&mut tx, shop_id, item).await?;
        }

        tx.commit().await?;

        Ok(ReplaceSummary {
            categories: feed.categories.len(),
            products: feed.goods.len(),
        })
    }
}

/// Look up or create the shop; the first writer becomes the owner.
///
/// An existing shop with a different owner fails the whole call before any
/// mutation - the conditional insert is a no-op when the name is taken.
async fn get_or_create_shop(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    owner: PrincipalId,
) -> Result<ShopId, CatalogError> {
    sqlx::query("INSERT INTO catalog.shop (name, owner_id) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .bind(owner)
        .execute(&mut **tx)
        .await?;

    let (shop_id, owner_id): (ShopId, PrincipalId) =
        sqlx::query_as("SELECT id, owner_id FROM catalog.shop WHERE name = $1")
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;

    if owner_id != owner {
        return Err(CatalogError::ShopNotOwned);
    }
    Ok(shop_id)
}

async fn get_or_create_category(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<CategoryId, CatalogError> {
    sqlx::query("INSERT INTO catalog.category (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(&mut **tx)
        .await?;

    let id: CategoryId = sqlx::query_scalar("SELECT id FROM catalog.category WHERE name = $1")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

/// Record that the shop offers the category (idempotent).
async fn offer_category_at_shop(
    tx: &mut Transaction<'_, Postgres>,
    shop_id: ShopId,
    category_id: CategoryId,
) -> Result<(), CatalogError> {
    sqlx::query(
        "INSERT INTO catalog.shop_category (shop_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(shop_id)
    .bind(category_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Look up or create a product by name.
///
/// A product keeps the category it was first created under; a feed that
/// later submits the same name under a different category reuses the
/// existing row unchanged.
async fn get_or_create_product(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    category_id: CategoryId,
) -> Result<ProductId, CatalogError> {
    sqlx::query(
        "INSERT INTO catalog.product (name, category_id) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
    )
    .bind(name)
    .bind(category_id)
    .execute(&mut **tx)
    .await?;

    let id: ProductId = sqlx::query_scalar("SELECT id FROM catalog.product WHERE name = $1")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

async fn get_or_create_parameter(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<ParameterId, CatalogError> {
    sqlx::query("INSERT INTO catalog.parameter (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(&mut **tx)
        .await?;

    let id: ParameterId = sqlx::query_scalar("SELECT id FROM catalog.parameter WHERE name = $1")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

/// Write one catalog entry: its category (attached to the shop), product,
/// product info row, and parameters.
async fn insert_product_info(
    tx: &mut Transaction<'_, Postgres>,
    shop_id: ShopId,
    item: &FeedItem,
) -> Result<(), CatalogError> {
    // An item may reference a category never declared at the top level; it
    // is created on demand and offered at the shop just the same.
    let category_id = get_or_create_category(tx, &item.category).await?;
    offer_category_at_shop(tx, shop_id, category_id).await?;

    let product_id = get_or_create_product(tx, &item.name, category_id).await?;

    let info_id: ProductInfoId = sqlx::query_scalar(
        "INSERT INTO catalog.product_info (product_id, shop_id, external_id, quantity, price, price_rrc)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(product_id)
    .bind(shop_id)
    .bind(item.external_id)
    .bind(item.quantity)
    .bind(item.price)
    .bind(item.price_rrc)
    .fetch_one(&mut **tx)
    .await?;

    for parameter in &item.parameters {
        let parameter_id = get_or_create_parameter(tx, &parameter.name).await?;
        sqlx::query(
            "INSERT INTO catalog.product_parameter (product_info_id, parameter_id, value) VALUES ($1, $2, $3)",
        )
        .bind(info_id)
        .bind(parameter_id)
        .bind(&parameter.value)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
