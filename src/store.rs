use anyhow::Context;
use async_trait::async_trait;
use sqlx::{pool::PoolConnection, postgres::PgPoolOptions, PgPool, Postgres};

use crate::{
    auth::{self, repo_types::{NewUser, User}},
    config::{is_valid_schema, DbConfig},
    error::StoreError,
    products::{self, repo_types::{CreatedProduct, NewProduct, ProductListing}},
};

/// Relational store behind both handlers. Injected through `AppState`.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list_products(&self) -> Result<Vec<ProductListing>, StoreError>;
    async fn create_product(&self, product: NewProduct) -> Result<CreatedProduct, StoreError>;
}

/// Postgres-backed store. Every table reference is qualified with `schema`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub async fn connect(cfg: &DbConfig) -> anyhow::Result<Self> {
        let url = cfg.url.as_deref().context("DATABASE_URL is not set")?;
        anyhow::ensure!(is_valid_schema(&cfg.schema), "invalid schema name: {}", cfg.schema);
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.connect_timeout)
            .connect(url)
            .await
            .context("connect to database")?;
        Ok(Self::from_parts(pool, cfg.schema.clone()))
    }

    pub fn from_parts(pool: PgPool, schema: String) -> Self {
        Self { pool, schema }
    }

    /// One connection per operation; it goes back to the pool when the guard drops.
    async fn conn(&self) -> Result<PoolConnection<Postgres>, StoreError> {
        Ok(self.pool.acquire().await?)
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut conn = self.conn().await?;
        Ok(auth::repo::insert_user(&mut conn, &self.schema, &user).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(auth::repo::find_by_email(&mut conn, &self.schema, email).await?)
    }

    async fn list_products(&self) -> Result<Vec<ProductListing>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(products::repo::list_all(&mut conn, &self.schema).await?)
    }

    async fn create_product(&self, product: NewProduct) -> Result<CreatedProduct, StoreError> {
        let mut conn = self.conn().await?;
        Ok(products::repo::insert_product(&mut conn, &self.schema, &product).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Executor;

    fn product(seller_id: i64, name: &str, compatibility: &[&str]) -> NewProduct {
        NewProduct {
            seller_id,
            name: name.into(),
            category: "Screens".into(),
            device: "Phone".into(),
            manufacturer: "Acme".into(),
            compatibility: compatibility.iter().map(|s| s.to_string()).collect(),
            price: 8500.0,
            description: String::new(),
            image_url: "/placeholder.svg".into(),
            in_stock: true,
        }
    }

    // Runs against a real server: DATABASE_URL=postgres://... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn pg_store_in_isolated_schema() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let schema = format!("market_test_{}", std::process::id());
        let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.unwrap();
        pool.execute(format!("CREATE SCHEMA {schema}").as_str()).await.unwrap();
        let ddl = include_str!("../sql/schema.sql").replace("public.", &format!("{schema}."));
        pool.execute(ddl.as_str()).await.unwrap();

        let store = PgStore::from_parts(pool.clone(), schema.clone());
        let user = store
            .create_user(NewUser {
                email: "pg@b.com".into(),
                password_hash: "h".into(),
                full_name: "Pg Seller".into(),
                phone: String::new(),
                is_seller: true,
            })
            .await
            .unwrap();
        let dup = store
            .create_user(NewUser {
                email: "pg@b.com".into(),
                password_hash: "h".into(),
                full_name: "Other".into(),
                phone: String::new(),
                is_seller: false,
            })
            .await;
        assert!(matches!(dup, Err(StoreError::UniqueViolation)));
        assert_eq!(store.find_user_by_email("pg@b.com").await.unwrap().unwrap().id, user.id);

        store.create_product(product(user.id, "older", &[])).await.unwrap();
        let created = store
            .create_product(product(user.id, "newer", &["usb-c", "wireless"]))
            .await
            .unwrap();
        assert_eq!(created.price, 8500.0);
        assert!(matches!(
            store.create_product(product(user.id + 1000, "orphan", &[])).await,
            Err(StoreError::ForeignKeyViolation)
        ));

        let listed = store.list_products().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "newer");
        assert_eq!(listed[0].compatibility, vec!["usb-c", "wireless"]);
        assert_eq!(listed[0].seller_name.as_deref(), Some("Pg Seller"));
        assert!(listed[1].compatibility.is_empty());

        pool.execute(format!("DROP SCHEMA {schema} CASCADE").as_str()).await.unwrap();
    }
}
