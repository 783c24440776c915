use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Merchant, OrderItem, Product};

pub async fn insert_merchant(merchant: &Merchant, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO merchants (id, name, business_category, pricing_model, latitude, longitude)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&merchant.id)
    .bind(&merchant.name)
    .bind(&merchant.business_category)
    .bind(merchant.pricing_model)
    .bind(merchant.latitude)
    .bind(merchant.longitude)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_merchant(id: &str, conn: &mut SqliteConnection) -> Result<Option<Merchant>, sqlx::Error> {
    let merchant = sqlx::query_as("SELECT * FROM merchants WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(merchant)
}

pub async fn insert_product(product: &Product, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO products (id, merchant_id, name, available_quantity) VALUES ($1, $2, $3, $4)")
        .bind(&product.id)
        .bind(&product.merchant_id)
        .bind(&product.name)
        .bind(product.available_quantity)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_product(id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

/// Reduces the available quantity of the merchant's product by `quantity`, stopping at zero. Returns false if the
/// product is not in the merchant's catalogue.
pub async fn reduce_quantity(
    product_id: &str,
    merchant_id: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET available_quantity = MAX(available_quantity - $3, 0) WHERE id = $1 AND merchant_id = $2",
    )
    .bind(product_id)
    .bind(merchant_id)
    .bind(quantity.max(0))
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Items without a product id are custom items and are not tracked.
pub fn tracked_items(items: &[OrderItem]) -> impl Iterator<Item = (&str, i64)> {
    items.iter().filter_map(|item| {
        let id = item.product_id.as_deref();
        if id.is_none() {
            debug!("🗃️ Item '{}' has no product id and is not stock-tracked", item.name);
        }
        id.map(|id| (id, item.quantity))
    })
}
