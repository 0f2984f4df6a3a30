//! Category catalog writes. Same soft-delete discipline as products.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use mercadito_core::{validation, Category};

use crate::error::StoreResult;
use crate::store::{Collection, MemoryStore};

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Partial update for a category.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

pub struct CategoryRepository {
    categories: Collection<Category>,
}

impl CategoryRepository {
    pub fn new(store: &MemoryStore) -> Self {
        CategoryRepository {
            categories: store.categories().clone(),
        }
    }

    pub async fn create(&self, input: NewCategory) -> StoreResult<Category> {
        debug!(name = %input.name, "creating category");
        validation::validate_name("name", &input.name)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            color: input.color,
            is_active: true,
            created_at: Utc::now(),
        };

        self.categories.create(category.clone()).await?;
        info!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn update(&self, id: &str, patch: CategoryPatch) -> StoreResult<Category> {
        if let Some(name) = &patch.name {
            validation::validate_name("name", name)?;
        }

        let updated = self
            .categories
            .update(id, |c| {
                if let Some(name) = patch.name {
                    c.name = name.trim().to_string();
                }
                if let Some(description) = patch.description {
                    c.description = Some(description);
                }
                if let Some(color) = patch.color {
                    c.color = Some(color);
                }
            })
            .await?;

        info!(category_id = %id, "category updated");
        Ok(updated)
    }

    pub async fn deactivate(&self, id: &str) -> StoreResult<()> {
        self.categories.update(id, |c| c.is_active = false).await?;
        info!(category_id = %id, "category deactivated");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StoreResult<Category> {
        self.categories.require(id).await
    }

    pub async fn list_active(&self) -> Vec<Category> {
        self.categories.find(|c| c.is_active).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_category_lifecycle() {
        let store = MemoryStore::new();
        let repo = CategoryRepository::new(&store);

        let category = repo
            .create(NewCategory {
                name: "Bebidas".to_string(),
                description: None,
                color: Some("#ff0000".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(repo.list_active().await.len(), 1);

        let patch = CategoryPatch {
            name: Some("Bebidas frías".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&category.id, patch).await.unwrap();
        assert_eq!(updated.name, "Bebidas frías");

        repo.deactivate(&category.id).await.unwrap();
        assert!(repo.list_active().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let store = MemoryStore::new();
        let repo = CategoryRepository::new(&store);
        let result = repo
            .create(NewCategory {
                name: "   ".to_string(),
                description: None,
                color: None,
            })
            .await;
        assert!(result.is_err());
    }
}
