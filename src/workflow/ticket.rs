//! The ticket-triage pipeline, triggered once per `ticket.created`.
//!
//! Sequence: fetch the ticket, AI-analyze it, persist triage data,
//! assign a moderator and notify them. Only a missing ticket is fatal to
//! the run; every later failure degrades to "continue without this
//! enrichment", so a ticket always ends up at least as useful as it was
//! at intake.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::engine::{StepError, StepRunner, Workflow};
use crate::events::TicketCreated;
use crate::mailer::MailSender;
use crate::model::{Role, Ticket, TicketPatch, TicketStatus, User};
use crate::store::{TicketStore, UserFilter, UserStore};
use crate::triage::{SkillMatcher, TriageAnalyzer, TriageResult};

fn retriable(e: impl std::fmt::Display) -> StepError {
    StepError::Retriable(e.to_string())
}

pub struct TicketTriage {
    tickets: Arc<dyn TicketStore>,
    users: Arc<dyn UserStore>,
    analyzer: TriageAnalyzer,
    mailer: Arc<dyn MailSender>,
}

impl TicketTriage {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        users: Arc<dyn UserStore>,
        analyzer: TriageAnalyzer,
        mailer: Arc<dyn MailSender>,
    ) -> Self {
        Self {
            tickets,
            users,
            analyzer,
            mailer,
        }
    }

    async fn fetch_ticket(&self, ticket_id: &str) -> Result<Ticket, StepError> {
        self.tickets
            .find_by_id(ticket_id)
            .await
            .map_err(retriable)?
            // Ticket ids are never reused; a missing ticket cannot be
            // fixed by retrying.
            .ok_or_else(|| StepError::Fatal(format!("ticket {ticket_id} not found")))
    }

    async fn apply_triage(&self, ticket_id: &str, triage: &TriageResult) -> Result<(), StepError> {
        let patch = TicketPatch {
            priority: Some(triage.priority),
            helpful_notes: triage.helpful_notes.clone(),
            related_skills: Some(triage.related_skills.clone()),
            status: Some(TicketStatus::InProgress),
            assigned_to: None,
        };
        self.tickets
            .update(ticket_id, patch)
            .await
            .map(|_| ())
            .map_err(retriable)
    }

    /// Selection and notification form one durable unit: a memoized
    /// assignment is never re-evaluated on retry, and a delivered
    /// notification is never re-sent.
    async fn assign_and_notify(
        &self,
        ticket: &Ticket,
        skills: &[String],
    ) -> Result<Option<User>, StepError> {
        let assignee = self.pick_assignee(skills).await?;
        let patch = TicketPatch {
            assigned_to: Some(assignee.as_ref().map(|u| u.id.clone())),
            ..Default::default()
        };
        self.tickets
            .update(&ticket.id, patch)
            .await
            .map_err(retriable)?;

        match &assignee {
            Some(user) => {
                info!(ticket = %ticket.id, assignee = %user.email, "ticket assigned");
                // Notification is advisory; a mail failure never fails the run.
                let subject = format!("New Ticket Assigned: {}", ticket.title);
                let body = format!(
                    "A new ticket has been assigned to you. Title: {}\n\n\
                     Please review it in the admin panel.",
                    ticket.title
                );
                if let Err(e) = self.mailer.send(&user.email, &subject, &body).await {
                    warn!(
                        ticket = %ticket.id,
                        to = %user.email,
                        error = %e,
                        "failed to send assignment notification"
                    );
                }
            }
            None => {
                info!(ticket = %ticket.id, "no skilled moderator or admin available, ticket left unassigned");
            }
        }
        Ok(assignee)
    }

    async fn pick_assignee(&self, skills: &[String]) -> Result<Option<User>, StepError> {
        if !skills.is_empty() {
            let moderators = self
                .users
                .list_by_role(Role::Moderator)
                .await
                .map_err(retriable)?;
            if let Some(moderator) = SkillMatcher::select(skills, &moderators) {
                return Ok(Some(moderator.clone()));
            }
        }
        // No skilled moderator (or no skills identified): any admin.
        self.users
            .find_one(&UserFilter::role(Role::Admin))
            .await
            .map_err(retriable)
    }
}

#[async_trait]
impl Workflow for TicketTriage {
    type Event = TicketCreated;

    fn id(&self) -> &'static str {
        "on-ticket-created"
    }

    fn run_key(&self, event: &TicketCreated) -> String {
        event.ticket_id.clone()
    }

    async fn run(&self, step: &mut StepRunner, event: &TicketCreated) -> Result<(), StepError> {
        let ticket = step
            .run("fetch-ticket", || self.fetch_ticket(&event.ticket_id))
            .await?;

        // The model call stays outside the durable-step boundary; see
        // TriageAnalyzer.
        let triage = self.analyzer.analyze(&ticket.title, &ticket.description).await;

        if let Some(triage) = &triage {
            step.run("update-ticket-with-triage", || {
                self.apply_triage(&ticket.id, triage)
            })
            .await?;
        }

        let skills: Vec<String> = triage.map(|t| t.related_skills).unwrap_or_default();
        let _assignee: Option<User> = step
            .run("assign-and-notify", || {
                self.assign_and_notify(&ticket, &skills)
            })
            .await?;

        Ok(())
    }
}
