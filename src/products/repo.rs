use sqlx::PgConnection;

use crate::products::repo_types::{CreatedProduct, NewProduct, ProductListing};

pub(crate) fn list_all_sql(schema: &str) -> String {
    format!(
        r#"
        SELECT p.id, p.name, p.category, p.device, p.manufacturer,
               COALESCE(p.compatibility, '{{}}') AS compatibility,
               p.price::float8 AS price,
               COALESCE(p.description, '') AS description,
               COALESCE(p.image_url, '') AS image_url,
               p.in_stock, p.created_at,
               u.full_name AS seller_name
          FROM {schema}.products p
          LEFT JOIN {schema}.users u ON p.seller_id = u.id
         ORDER BY p.created_at DESC, p.id DESC
        "#
    )
}

pub(crate) fn insert_product_sql(schema: &str) -> String {
    format!(
        r#"
        INSERT INTO {schema}.products
            (seller_id, name, category, device, manufacturer, compatibility,
             price, description, image_url, in_stock)
        VALUES ($1, $2, $3, $4, $5, $6, $7::numeric, $8, $9, $10)
        RETURNING id, name, category, device, manufacturer, price::float8 AS price, in_stock
        "#
    )
}

/// All products, newest first, with the seller's full name when the seller still exists.
pub async fn list_all(conn: &mut PgConnection, schema: &str) -> Result<Vec<ProductListing>, sqlx::Error> {
    sqlx::query_as::<_, ProductListing>(&list_all_sql(schema))
        .fetch_all(conn)
        .await
}

pub async fn insert_product(
    conn: &mut PgConnection,
    schema: &str,
    new: &NewProduct,
) -> Result<CreatedProduct, sqlx::Error> {
    sqlx::query_as::<_, CreatedProduct>(&insert_product_sql(schema))
        .bind(new.seller_id)
        .bind(&new.name)
        .bind(&new.category)
        .bind(&new.device)
        .bind(&new.manufacturer)
        .bind(&new.compatibility)
        .bind(new.price)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(new.in_stock)
        .fetch_one(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_query_shape() {
        let sql = list_all_sql("shop_a");
        assert!(sql.contains("FROM shop_a.products p"));
        assert!(sql.contains("LEFT JOIN shop_a.users u ON p.seller_id = u.id"));
        assert!(sql.contains("COALESCE(p.compatibility, '{}') AS compatibility"));
        assert!(sql.contains("ORDER BY p.created_at DESC, p.id DESC"));
        assert!(sql.contains("u.full_name AS seller_name"));
        // Every table reference is qualified.
        assert_eq!(sql.matches(".products").count(), 1);
        assert_eq!(sql.matches(".users").count(), 1);
        assert_eq!(sql.matches("shop_a.").count(), 2);
    }

    #[test]
    fn insert_query_shape() {
        let sql = insert_product_sql("shop_a");
        assert!(sql.contains("INSERT INTO shop_a.products"));
        assert_eq!(sql.matches("shop_a.").count(), 1);
        assert!(sql.contains("$7::numeric"));
        assert!(sql.contains("RETURNING id, name, category, device, manufacturer, price::float8 AS price, in_stock"));
        assert!(!sql.contains("seller_name"));
    }
}
