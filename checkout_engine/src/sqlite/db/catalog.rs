use std::str::FromStr;

use cko_common::Money;
use log::trace;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{CatalogItem, ItemVariant},
    traits::CatalogError,
};

#[derive(Debug, Clone, FromRow)]
struct ItemRow {
    id: String,
    name: String,
    price: String,
}

#[derive(Debug, Clone, FromRow)]
struct VariantRow {
    name: String,
    price: String,
}

fn parse_price(item_id: &str, price: &str) -> Result<Money, CatalogError> {
    Money::from_str(price).map_err(|e| CatalogError::DataIntegrityError(format!("Item {item_id} has a bad price. {e}")))
}

/// Fetches an item with all of its variants. Variants are returned in the order they were added.
pub async fn fetch_item(item_id: &str, conn: &mut SqliteConnection) -> Result<Option<CatalogItem>, CatalogError> {
    let row: Option<ItemRow> = sqlx::query_as("SELECT id, name, price FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(row) = row else {
        trace!("🛒️ Item {item_id} is not in the catalog");
        return Ok(None);
    };
    let variants: Vec<VariantRow> =
        sqlx::query_as("SELECT name, price FROM item_variants WHERE item_id = $1 ORDER BY id ASC")
            .bind(item_id)
            .fetch_all(conn)
            .await?;
    let variants = variants
        .into_iter()
        .map(|v| parse_price(item_id, &v.price).map(|price| ItemVariant { name: v.name, price }))
        .collect::<Result<Vec<_>, _>>()?;
    let price = parse_price(item_id, &row.price)?;
    Ok(Some(CatalogItem { id: row.id, name: row.name, price, variants }))
}

/// Creates or replaces an item and its full set of variants. Call inside a transaction.
pub async fn upsert_item(item: &CatalogItem, conn: &mut SqliteConnection) -> Result<(), CatalogError> {
    sqlx::query(
        r#"
            INSERT INTO items (id, name, price) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = excluded.name, price = excluded.price, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&item.id)
    .bind(&item.name)
    .bind(item.price.value().to_string())
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM item_variants WHERE item_id = $1").bind(&item.id).execute(&mut *conn).await?;
    for variant in &item.variants {
        sqlx::query("INSERT INTO item_variants (item_id, name, price) VALUES ($1, $2, $3)")
            .bind(&item.id)
            .bind(&variant.name)
            .bind(variant.price.value().to_string())
            .execute(&mut *conn)
            .await?;
    }
    trace!("🛒️ Item {} saved with {} variants", item.id, item.variants.len());
    Ok(())
}
