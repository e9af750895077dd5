//! Persistent-store collaborators for tickets and users.
//!
//! The pipeline only depends on the [`TicketStore`] and [`UserStore`]
//! traits; the in-memory implementations in [`memory`] back the CLI, the
//! demo, and tests. Both stores are assumed to provide atomic
//! per-document read-modify-write, which [`memory`] satisfies with a
//! single write lock per call.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryTicketStore, MemoryUserStore};

use crate::model::{Role, Ticket, TicketPatch, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the operation did not complete.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An update referenced a document that does not exist.
    #[error("no such document: {0}")]
    Missing(String),
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert(&self, ticket: Ticket) -> Result<Ticket, StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, StoreError>;
    /// Atomically merge `patch` into the ticket and return the updated document.
    async fn update(&self, id: &str, patch: TicketPatch) -> Result<Ticket, StoreError>;
}

/// Filter for [`UserStore::find_one`]: role equality and/or exact email.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub email: Option<String>,
}

impl UserFilter {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// First user matching the filter, in ascending id order.
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError>;
    /// All users with the given role, in ascending id order.
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;
}
