//! # Product Repository
//!
//! Catalog writes for products: create, patch, deactivate, and the image
//! replacement dance (upload new blob, swap the document ref, then
//! best-effort delete of the old blob).

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mercadito_core::{validation, AlternatePrice, CoreError, Product, UnitType};

use crate::error::StoreResult;
use crate::object::ObjectStorage;
use crate::store::{Collection, MemoryStore};

/// Blob path prefix for product images.
const IMAGE_PATH: &str = "products";

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: f64,
    pub unit_type: UnitType,
    pub barcode: Option<String>,
    pub returnable: bool,
    pub alternate_price: Option<AlternatePrice>,
    pub category_id: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// Partial update for a product. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<f64>,
    pub barcode: Option<String>,
    pub returnable: Option<bool>,
    pub alternate_price: Option<AlternatePrice>,
    pub category_id: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// Repository for product catalog operations.
pub struct ProductRepository {
    products: Collection<Product>,
    storage: Arc<dyn ObjectStorage>,
}

impl ProductRepository {
    pub fn new(store: &MemoryStore, storage: Arc<dyn ObjectStorage>) -> Self {
        ProductRepository {
            products: store.products().clone(),
            storage,
        }
    }

    /// Creates a product, uploading its image first if one was provided.
    pub async fn create(&self, input: NewProduct) -> StoreResult<Product> {
        debug!(name = %input.name, "creating product");

        validation::validate_name("name", &input.name)?;
        validation::validate_price_cents(input.price_cents)?;
        validation::validate_stock(input.stock)?;
        if let Some(alt) = &input.alternate_price {
            validation::validate_price_cents(alt.price_cents)?;
        }

        let image_ref = match input.image {
            Some(bytes) => Some(self.storage.upload(IMAGE_PATH, bytes)?),
            None => None,
        };

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            stock: input.stock,
            unit_type: input.unit_type,
            barcode: input.barcode,
            returnable: input.returnable,
            alternate_price: input.alternate_price,
            category_id: input.category_id,
            image_ref,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.products.create(product.clone()).await?;
        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Applies a partial update. A new image replaces the old blob; the
    /// stale blob is deleted best-effort after the document write.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> StoreResult<Product> {
        debug!(product_id = %id, "updating product");

        if let Some(name) = &patch.name {
            validation::validate_name("name", name)?;
        }
        if let Some(price) = patch.price_cents {
            validation::validate_price_cents(price)?;
        }
        if let Some(stock) = patch.stock {
            validation::validate_stock(stock)?;
        }
        if let Some(alt) = &patch.alternate_price {
            validation::validate_price_cents(alt.price_cents)?;
        }

        let current = self.products.require(id).await?;

        let new_image_ref = match patch.image {
            Some(bytes) => Some(self.storage.upload(IMAGE_PATH, bytes)?),
            None => None,
        };
        let old_image_ref = if new_image_ref.is_some() {
            current.image_ref.clone()
        } else {
            None
        };

        let updated = self
            .products
            .update(id, |p| {
                if let Some(name) = patch.name {
                    p.name = name.trim().to_string();
                }
                if let Some(price) = patch.price_cents {
                    p.price_cents = price;
                }
                if let Some(stock) = patch.stock {
                    p.stock = stock;
                }
                if let Some(barcode) = patch.barcode {
                    p.barcode = Some(barcode);
                }
                if let Some(returnable) = patch.returnable {
                    p.returnable = returnable;
                }
                if let Some(alt) = patch.alternate_price {
                    p.alternate_price = Some(alt);
                }
                if let Some(category) = patch.category_id {
                    p.category_id = Some(category);
                }
                if let Some(image_ref) = new_image_ref {
                    p.image_ref = Some(image_ref);
                }
                p.updated_at = Utc::now();
            })
            .await?;

        // The document now points at the new blob; losing the old one is
        // a storage leak at worst, never a data error.
        if let Some(stale) = old_image_ref {
            if let Err(err) = self.storage.delete(&stale) {
                warn!(product_id = %id, object_ref = %stale, error = %err,
                      "failed to delete replaced product image");
            }
        }

        info!(product_id = %id, "product updated");
        Ok(updated)
    }

    /// Soft delete: the product stays referenced by historical sales but
    /// disappears from active listings and the catalog cache.
    pub async fn deactivate(&self, id: &str) -> StoreResult<()> {
        self.products
            .update(id, |p| {
                p.is_active = false;
                p.updated_at = Utc::now();
            })
            .await?;
        info!(product_id = %id, "product deactivated");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StoreResult<Product> {
        self.products
            .require(id)
            .await
            .map_err(|_| CoreError::ProductNotFound(id.to_string()).into())
    }

    pub async fn list_active(&self) -> Vec<Product> {
        self.products.find(|p| p.is_active).await
    }

    /// Serving URL for a product's image, if it has one.
    pub fn image_url(&self, product: &Product) -> StoreResult<Option<String>> {
        match &product.image_ref {
            Some(object_ref) => Ok(Some(self.storage.url(object_ref)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MemoryObjectStorage;

    fn repo() -> (ProductRepository, Arc<MemoryObjectStorage>, MemoryStore) {
        let store = MemoryStore::new();
        let storage = Arc::new(MemoryObjectStorage::new());
        let repo = ProductRepository::new(&store, storage.clone());
        (repo, storage, store)
    }

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price_cents: 1800,
            stock: 10.0,
            unit_type: UnitType::Unit,
            barcode: None,
            returnable: false,
            alternate_price: None,
            category_id: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let (repo, _, _) = repo();
        let product = repo.create(new_product("Coca 600ml")).await.unwrap();
        assert!(product.is_active);

        let fetched = repo.get(&product.id).await.unwrap();
        assert_eq!(fetched.name, "Coca 600ml");
        assert_eq!(fetched.price_cents, 1800);
    }

    #[tokio::test]
    async fn test_create_rejects_zero_price() {
        let (repo, _, _) = repo();
        let mut input = new_product("Gratis");
        input.price_cents = 0;
        assert!(repo.create(input).await.is_err());
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_active_list() {
        let (repo, _, _) = repo();
        let product = repo.create(new_product("Coca 600ml")).await.unwrap();
        assert_eq!(repo.list_active().await.len(), 1);

        repo.deactivate(&product.id).await.unwrap();
        assert!(repo.list_active().await.is_empty());
        // Still resolvable by id for historical sales.
        assert!(repo.get(&product.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_image_replacement_deletes_old_blob() {
        let (repo, storage, _) = repo();
        let mut input = new_product("Queso");
        input.image = Some(vec![1, 2, 3]);
        let product = repo.create(input).await.unwrap();
        let first_ref = product.image_ref.clone().unwrap();
        assert!(storage.contains(&first_ref));

        let patch = ProductPatch {
            image: Some(vec![4, 5, 6]),
            ..Default::default()
        };
        let updated = repo.update(&product.id, patch).await.unwrap();
        let second_ref = updated.image_ref.unwrap();

        assert_ne!(first_ref, second_ref);
        assert!(storage.contains(&second_ref));
        assert!(!storage.contains(&first_ref));
    }
}
