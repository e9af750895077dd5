//! Ticket intake: the caller-facing edge of the pipeline.
//!
//! Persisting the ticket and publishing the trigger event are
//! independent transactions, with persistence authoritative: once the
//! ticket is saved, intake reports success to the caller no matter what
//! happens to the event. A failed publish only means the ticket waits
//! for manual triage.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::TriagoError;
use crate::events::{Event, SharedEventBus, TicketCreated};
use crate::model::Ticket;
use crate::store::TicketStore;

pub struct TicketIntake {
    tickets: Arc<dyn TicketStore>,
    bus: SharedEventBus,
}

impl TicketIntake {
    pub fn new(tickets: Arc<dyn TicketStore>, bus: SharedEventBus) -> Self {
        Self { tickets, bus }
    }

    pub async fn create_ticket(
        &self,
        title: &str,
        description: &str,
        created_by: &str,
    ) -> Result<Ticket, TriagoError> {
        if title.trim().is_empty() || description.trim().is_empty() {
            return Err(TriagoError::InvalidTicket);
        }

        let ticket = self
            .tickets
            .insert(Ticket::new(title, description, created_by))
            .await?;

        let event = Event::TicketCreated(TicketCreated {
            ticket_id: ticket.id.clone(),
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            created_by: ticket.created_by.clone(),
            emitted_at: Utc::now(),
        });
        match self.bus.publish(event) {
            Ok(ack) => {
                info!(ticket = %ticket.id, receivers = ack.receivers, "ticket.created published");
            }
            Err(e) => {
                warn!(
                    ticket = %ticket.id,
                    error = %e,
                    "event publication failed; ticket is saved and awaits manual triage"
                );
            }
        }

        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::model::TicketStatus;
    use crate::store::MemoryTicketStore;

    #[tokio::test]
    async fn creates_submitted_ticket_and_publishes() {
        let tickets = Arc::new(MemoryTicketStore::new());
        let bus = EventBus::new().shared();
        let mut rx = bus.subscribe();
        let intake = TicketIntake::new(tickets.clone(), bus);

        let ticket = intake
            .create_ticket("Login broken", "cannot sign in", "u-1")
            .await
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Submitted);
        assert!(tickets.find_by_id(&ticket.id).await.unwrap().is_some());

        let event = rx.recv().await.unwrap();
        match event {
            Event::TicketCreated(payload) => {
                assert_eq!(payload.ticket_id, ticket.id);
                assert_eq!(payload.created_by, "u-1");
            }
            other => panic!("expected ticket.created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_failure_does_not_roll_back_the_ticket() {
        let tickets = Arc::new(MemoryTicketStore::new());
        // No subscribers: publishing fails, the ticket must survive.
        let bus = EventBus::new().shared();
        let intake = TicketIntake::new(tickets.clone(), bus);

        let ticket = intake
            .create_ticket("Login broken", "cannot sign in", "u-1")
            .await
            .unwrap();

        let stored = tickets.find_by_id(&ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Submitted);
    }

    #[tokio::test]
    async fn empty_fields_are_rejected() {
        let tickets = Arc::new(MemoryTicketStore::new());
        let intake = TicketIntake::new(tickets, EventBus::new().shared());

        let err = intake.create_ticket("  ", "desc", "u-1").await.unwrap_err();
        assert!(matches!(err, TriagoError::InvalidTicket));
        let err = intake.create_ticket("title", "", "u-1").await.unwrap_err();
        assert!(matches!(err, TriagoError::InvalidTicket));
    }
}
