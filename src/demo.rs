//! Embedded end-to-end demonstration of the triage pipeline.
//!
//! Seeds an in-memory staff roster, pushes one ticket through intake,
//! the event bus, and the triage workflow using a canned model reply,
//! then runs the signup-welcome workflow on the same executor. No
//! network access involved.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::config::TriagoConfig;
use crate::engine::{Engine, InMemoryRunStore, RunStore};
use crate::events::{Event, EventBus, EventConsumer, UserSignedUp};
use crate::gemini::types::{Candidate, Content, GenerateResponse, Part};
use crate::gemini::{ContentGenerator, GeminiError, GenerateRequest};
use crate::intake::TicketIntake;
use crate::mailer::LogMailer;
use crate::model::{Role, User};
use crate::store::{MemoryTicketStore, MemoryUserStore, TicketStore, UserStore};
use crate::triage::TriageAnalyzer;
use crate::ui::RunProgress;
use crate::workflow::{SignupWelcome, TicketTriage};

const DEMO_REPLY: &str = "Sure! Here is the analysis:\n```json\n{\"summary\": \"Webhook deliveries are rejected by the signature check and retried forever.\", \"priority\": \"high\", \"helpfulNotes\": \"Verify the webhook signing secret against the dashboard value and check for server clock skew.\", \"relatedSkills\": [\"payments\", \"webhooks\"]}\n```";

/// Stands in for the Gemini API so the demo runs offline.
struct CannedGenerator;

#[async_trait]
impl ContentGenerator for CannedGenerator {
    async fn generate(&self, _req: &GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        Ok(GenerateResponse {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".into()),
                    parts: vec![Part {
                        text: DEMO_REPLY.to_string(),
                    }],
                }),
                finish_reason: Some("STOP".into()),
            }],
            usage_metadata: None,
        })
    }
}

fn demo_staff() -> Vec<User> {
    vec![
        User {
            id: "demo-admin".into(),
            email: "admin@example.com".into(),
            role: Role::Admin,
            skills: Vec::new(),
        },
        User {
            id: "demo-mod-pay".into(),
            email: "pay-mod@example.com".into(),
            role: Role::Moderator,
            skills: vec!["payments".into(), "Stripe".into()],
        },
        User {
            id: "demo-mod-web".into(),
            email: "web-mod@example.com".into(),
            role: Role::Moderator,
            skills: vec!["React".into(), "CSS".into()],
        },
    ]
}

pub async fn run(config: &TriagoConfig) -> Result<()> {
    let staff = if config.staff.is_empty() {
        demo_staff()
    } else {
        config.staff.iter().map(|s| s.to_user()).collect()
    };
    let welcome_email = staff
        .first()
        .map(|u| u.email.clone())
        .unwrap_or_else(|| "admin@example.com".to_string());

    let tickets: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
    let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::seeded(staff));
    let engine = Engine::new(
        Arc::new(InMemoryRunStore::new()) as Arc<dyn RunStore>,
        config.retry_config(),
    );
    let bus = EventBus::new().shared();

    let triage = Arc::new(TicketTriage::new(
        tickets.clone(),
        users.clone(),
        TriageAnalyzer::new(Arc::new(CannedGenerator)),
        Arc::new(LogMailer),
    ));
    let mut triage_consumer = EventConsumer::new(engine.clone(), triage, bus.subscribe());
    let welcome = Arc::new(SignupWelcome::new(users, Arc::new(LogMailer)));
    let mut welcome_consumer = EventConsumer::new(engine, welcome, bus.subscribe());
    debug!(subscribers = bus.subscriber_count(), "demo bus ready");

    let intake = TicketIntake::new(tickets.clone(), bus.clone());
    let ticket = intake
        .create_ticket(
            "Payment webhook retries forever",
            "Since yesterday our payment provider keeps redelivering the same webhook; \
             every request is rejected with a signature error.",
            "demo-user",
        )
        .await?;

    let progress = RunProgress::start(&ticket.title);
    let record = triage_consumer
        .process_next()
        .await
        .context("event bus closed before the triage run completed")?;
    progress.complete(&record.outcome);
    progress.print_record(&record);

    if let Some(enriched) = tickets.find_by_id(&ticket.id).await? {
        println!("\n{}", serde_json::to_string_pretty(&enriched)?);
    }

    // Second workflow on the same executor: the signup welcome mail.
    bus.publish(Event::UserSignedUp(UserSignedUp {
        email: welcome_email,
        emitted_at: Utc::now(),
    }))?;
    let welcome_progress = RunProgress::start("welcome mail");
    let welcome_record = welcome_consumer
        .process_next()
        .await
        .context("event bus closed before the welcome run completed")?;
    welcome_progress.complete(&welcome_record.outcome);

    Ok(())
}
