//! # Identity Module
//!
//! The identity seam: "who is the acting cashier right now". The ledger
//! and registries only ever need an opaque actor id, available while an
//! authenticated session exists; operations that need one fail with
//! [`StoreError::ActorRequired`] when it is absent.

use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};

/// Source of the current actor id.
pub trait Identity: Send + Sync {
    /// The authenticated actor id, if a session exists.
    fn current_actor(&self) -> Option<String>;

    /// The actor id, or ActorRequired.
    fn require_actor(&self) -> StoreResult<String> {
        self.current_actor().ok_or(StoreError::ActorRequired)
    }
}

/// A session-scoped identity: signed in or not.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    actor: RwLock<Option<String>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for an already-signed-in session.
    pub fn signed_in(actor: impl Into<String>) -> Self {
        SessionIdentity {
            actor: RwLock::new(Some(actor.into())),
        }
    }

    pub fn sign_in(&self, actor: impl Into<String>) {
        *self.actor.write().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(actor.into());
    }

    pub fn sign_out(&self) {
        *self.actor.write().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

impl Identity for SessionIdentity {
    fn current_actor(&self) -> Option<String> {
        self.actor.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}
