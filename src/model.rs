use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a support ticket.
///
/// A ticket enters as SUBMITTED; the triage pipeline may move it to
/// IN_PROGRESS, and moderators take it from there. Once a ticket has
/// left SUBMITTED it never returns to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Submitted,
    InProgress,
    Resolved,
    Closed,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Submitted => write!(f, "SUBMITTED"),
            TicketStatus::InProgress => write!(f, "IN_PROGRESS"),
            TicketStatus::Resolved => write!(f, "RESOLVED"),
            TicketStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Ticket priority as estimated by triage. A ticket with no priority yet
/// carries `None` ("unset").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Exact-match parsing; anything else is rejected so the caller can
    /// normalize it.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Role of an account in the ticketing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

/// An account, read-only from the pipeline's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Option<Priority>,
    pub helpful_notes: Option<String>,
    #[serde(default)]
    pub related_skills: Vec<String>,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(title: &str, description: &str, created_by: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            status: TicketStatus::Submitted,
            priority: None,
            helpful_notes: None,
            related_skills: Vec::new(),
            assigned_to: None,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Apply a partial update in place.
    ///
    /// Status regressions to SUBMITTED are discarded: once triage has moved
    /// a ticket forward it never reappears in the intake queue.
    pub fn apply(&mut self, patch: &TicketPatch) {
        if let Some(priority) = patch.priority {
            self.priority = Some(priority);
        }
        if let Some(notes) = &patch.helpful_notes {
            self.helpful_notes = Some(notes.clone());
        }
        if let Some(skills) = &patch.related_skills {
            self.related_skills = skills.clone();
        }
        if let Some(status) = patch.status
            && !(status == TicketStatus::Submitted && self.status != TicketStatus::Submitted)
        {
            self.status = status;
        }
        if let Some(assignee) = &patch.assigned_to {
            self.assigned_to = assignee.clone();
        }
    }
}

/// Partial field update for a ticket, mirroring the store's
/// `update(id, partialFields)` contract. `None` leaves a field untouched;
/// `assigned_to` uses a nested `Option` so an update can explicitly clear
/// the assignee.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketPatch {
    pub priority: Option<Priority>,
    pub helpful_notes: Option<String>,
    pub related_skills: Option<Vec<String>>,
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<Option<String>>,
}
