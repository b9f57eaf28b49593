use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{
    auth::repo_types::{NewUser, User},
    error::StoreError,
    products::repo_types::{CreatedProduct, NewProduct, ProductListing},
    store::MarketStore,
};

#[derive(Debug)]
struct StoredProduct {
    id: i64,
    seller_id: i64,
    data: NewProduct,
    created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    products: Vec<StoredProduct>,
}

/// In-process store with the same uniqueness and seller constraints as the
/// Postgres schema. Ids start at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.lock().await;
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::UniqueViolation);
        }
        let user = User {
            id: t.users.len() as i64 + 1,
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            phone: new.phone,
            is_seller: new.is_seller,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_products(&self) -> Result<Vec<ProductListing>, StoreError> {
        let t = self.tables.lock().await;
        let mut rows: Vec<&StoredProduct> = t.products.iter().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .map(|p| ProductListing {
                id: p.id,
                name: p.data.name.clone(),
                category: p.data.category.clone(),
                device: p.data.device.clone(),
                manufacturer: p.data.manufacturer.clone(),
                compatibility: p.data.compatibility.clone(),
                price: p.data.price,
                description: p.data.description.clone(),
                image_url: p.data.image_url.clone(),
                in_stock: p.data.in_stock,
                created_at: p.created_at,
                seller_name: t
                    .users
                    .iter()
                    .find(|u| u.id == p.seller_id)
                    .map(|u| u.full_name.clone()),
            })
            .collect())
    }

    async fn create_product(&self, new: NewProduct) -> Result<CreatedProduct, StoreError> {
        let mut t = self.tables.lock().await;
        if !t.users.iter().any(|u| u.id == new.seller_id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        let id = t.products.len() as i64 + 1;
        let created = CreatedProduct {
            id,
            name: new.name.clone(),
            category: new.category.clone(),
            device: new.device.clone(),
            manufacturer: new.manufacturer.clone(),
            price: new.price,
            in_stock: new.in_stock,
        };
        t.products.push(StoredProduct {
            id,
            seller_id: new.seller_id,
            data: new,
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(created)
    }
}
