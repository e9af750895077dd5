use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, TicketStore, UserFilter, UserStore};
use crate::model::{Role, Ticket, TicketPatch, User};

/// In-memory ticket store. One write lock per call gives the atomic
/// read-modify-write the pipeline expects from the real store.
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<HashMap<String, Ticket>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn insert(&self, ticket: Ticket) -> Result<Ticket, StoreError> {
        let mut tickets = self.tickets.write().await;
        tickets.insert(ticket.id.clone(), ticket.clone());
        Ok(ticket)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Ticket>, StoreError> {
        let tickets = self.tickets.read().await;
        Ok(tickets.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: TicketPatch) -> Result<Ticket, StoreError> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        ticket.apply(&patch);
        Ok(ticket.clone())
    }
}

/// In-memory user store, seeded once at startup.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }
}

fn matches(user: &User, filter: &UserFilter) -> bool {
    if let Some(role) = filter.role
        && user.role != role
    {
        return false;
    }
    if let Some(email) = &filter.email
        && &user.email != email
    {
        return false;
    }
    true
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        let mut candidates: Vec<&User> = users.iter().filter(|u| matches(u, filter)).collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(candidates.first().map(|u| (*u).clone()))
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut found: Vec<User> = users.iter().filter(|u| u.role == role).cloned().collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TicketStatus;

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            role,
            skills: Vec::new(),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryTicketStore::new();
        let ticket = store
            .insert(Ticket::new("T", "D", "u"))
            .await
            .unwrap();
        let found = store.find_by_id(&ticket.id).await.unwrap().unwrap();
        assert_eq!(found, ticket);
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_merges_patch() {
        let store = MemoryTicketStore::new();
        let ticket = store.insert(Ticket::new("T", "D", "u")).await.unwrap();
        let updated = store
            .update(
                &ticket.id,
                TicketPatch {
                    status: Some(TicketStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, TicketStatus::InProgress);
        assert_eq!(updated.title, "T");
    }

    #[tokio::test]
    async fn update_missing_ticket_errors() {
        let store = MemoryTicketStore::new();
        let err = store
            .update("nope", TicketPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
    }

    #[tokio::test]
    async fn find_one_filters_and_orders_by_id() {
        let store = MemoryUserStore::seeded(vec![
            user("b", Role::Admin),
            user("a", Role::Admin),
            user("c", Role::Moderator),
        ]);
        let admin = store
            .find_one(&UserFilter::role(Role::Admin))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.id, "a");

        let by_email = store
            .find_one(&UserFilter::email("c@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, "c");

        assert!(store
            .find_one(&UserFilter::role(Role::User))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_by_role_is_sorted() {
        let store = MemoryUserStore::seeded(vec![
            user("m2", Role::Moderator),
            user("m1", Role::Moderator),
            user("a1", Role::Admin),
        ]);
        let moderators = store.list_by_role(Role::Moderator).await.unwrap();
        let ids: Vec<&str> = moderators.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }
}
