//! # Client Repository
//!
//! Registry writes for clients. Creation stamps the acting cashier into
//! `created_by`. Deletes are hard: Sales keep working because they carry
//! the client name as a snapshot, so a dangling client id only degrades
//! to the snapshot name.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use mercadito_core::{validation, Client, CoreError};

use crate::error::StoreResult;
use crate::identity::Identity;
use crate::store::{Collection, MemoryStore};

/// Input for registering a client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Partial update for a client.
#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

pub struct ClientRepository {
    clients: Collection<Client>,
    identity: Arc<dyn Identity>,
}

impl ClientRepository {
    pub fn new(store: &MemoryStore, identity: Arc<dyn Identity>) -> Self {
        ClientRepository {
            clients: store.clients().clone(),
            identity,
        }
    }

    /// Registers a client, stamped with the acting cashier.
    pub async fn create(&self, input: NewClient) -> StoreResult<Client> {
        let actor = self.identity.require_actor()?;
        debug!(name = %input.name, actor = %actor, "registering client");

        validation::validate_name("name", &input.name)?;

        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            phone: input.phone,
            email: input.email,
            created_at: Utc::now(),
            created_by: actor,
        };

        self.clients.create(client.clone()).await?;
        info!(client_id = %client.id, name = %client.name, "client registered");
        Ok(client)
    }

    pub async fn update(&self, id: &str, patch: ClientPatch) -> StoreResult<Client> {
        if let Some(name) = &patch.name {
            validation::validate_name("name", name)?;
        }

        let updated = self
            .clients
            .update(id, |c| {
                if let Some(name) = patch.name {
                    c.name = name.trim().to_string();
                }
                if let Some(phone) = patch.phone {
                    c.phone = Some(phone);
                }
                if let Some(email) = patch.email {
                    c.email = Some(email);
                }
            })
            .await?;

        info!(client_id = %id, "client updated");
        Ok(updated)
    }

    /// Hard delete. Historical sales keep their name snapshots.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.clients.delete(id).await?;
        info!(client_id = %id, "client deleted");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StoreResult<Client> {
        self.clients
            .require(id)
            .await
            .map_err(|_| CoreError::ClientNotFound(id.to_string()).into())
    }

    pub async fn list(&self) -> Vec<Client> {
        self.clients.find(|_| true).await
    }
}
