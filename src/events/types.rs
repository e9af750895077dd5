use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trigger payload for the ticket-triage workflow, emitted once per
/// ticket creation. Immutable; redeliveries carry the same `ticket_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCreated {
    pub ticket_id: String,
    pub title: String,
    pub description: String,
    pub created_by: String,
    pub emitted_at: DateTime<Utc>,
}

/// Trigger payload for the signup-welcome workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSignedUp {
    pub email: String,
    pub emitted_at: DateTime<Utc>,
}

/// Envelope carried on the event bus. Serializes as `{name, data}` so the
/// wire shape matches the external transport contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data")]
pub enum Event {
    #[serde(rename = "ticket.created")]
    TicketCreated(TicketCreated),
    #[serde(rename = "user.signup")]
    UserSignedUp(UserSignedUp),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::TicketCreated(_) => "ticket.created",
            Event::UserSignedUp(_) => "user.signup",
        }
    }
}

/// Extracts one workflow's typed payload from the bus envelope.
pub trait FromEvent: Sized {
    fn from_event(event: &Event) -> Option<&Self>;
}

impl FromEvent for TicketCreated {
    fn from_event(event: &Event) -> Option<&Self> {
        match event {
            Event::TicketCreated(payload) => Some(payload),
            _ => None,
        }
    }
}

impl FromEvent for UserSignedUp {
    fn from_event(event: &Event) -> Option<&Self> {
        match event {
            Event::UserSignedUp(payload) => Some(payload),
            _ => None,
        }
    }
}
