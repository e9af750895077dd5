mod cli;
mod config;
mod demo;
mod engine;
mod error;
mod events;
mod gemini;
mod intake;
mod mailer;
mod model;
mod store;
mod triage;
mod ui;
mod workflow;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::Style;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::TriagoConfig;
use engine::{Engine, FileRunStore, RunStatus, RunStore};
use events::{EventBus, EventConsumer};
use gemini::GeminiClient;
use intake::TicketIntake;
use mailer::{HttpMailer, LogMailer, MailSender};
use store::{MemoryTicketStore, MemoryUserStore, TicketStore};
use triage::TriageAnalyzer;
use ui::RunProgress;
use workflow::TicketTriage;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "triago=debug"
    } else {
        "triago=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = TriagoConfig::load()?;

    match cli.command {
        Command::Submit { title, description } => submit(&config, &title, &description).await,
        Command::Status => status(&config),
        Command::Demo => demo::run(&config).await,
    }
}

async fn submit(config: &TriagoConfig, title: &str, description: &str) -> Result<()> {
    let tickets: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
    let users = Arc::new(MemoryUserStore::seeded(
        config.staff.iter().map(|s| s.to_user()).collect(),
    ));

    let analyzer = if config.gemini_api_key.is_empty() {
        TriageAnalyzer::disabled()
    } else {
        TriageAnalyzer::new(Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )))
    };
    let mailer: Arc<dyn MailSender> = if config.mail.api_token.is_empty() {
        Arc::new(LogMailer)
    } else {
        Arc::new(HttpMailer::new(
            config.mail.api_token.clone(),
            config.mail.from_email.clone(),
        ))
    };

    let run_store = Arc::new(FileRunStore::open(&config.run_store_path)?) as Arc<dyn RunStore>;
    let engine = Engine::new(run_store, config.retry_config());
    let workflow = Arc::new(TicketTriage::new(
        tickets.clone(),
        users,
        analyzer,
        mailer,
    ));

    let bus = EventBus::new().shared();
    let mut consumer = EventConsumer::new(engine, workflow, bus.subscribe());
    let intake = TicketIntake::new(tickets.clone(), bus);

    let ticket = intake.create_ticket(title, description, "cli").await?;
    let progress = RunProgress::start(&ticket.title);
    let record = consumer
        .process_next()
        .await
        .context("event bus closed before the run completed")?;
    progress.complete(&record.outcome);
    progress.print_record(&record);

    if let Some(final_ticket) = tickets.find_by_id(&ticket.id).await? {
        println!("\n{}", serde_json::to_string_pretty(&final_ticket)?);
    }
    Ok(())
}

fn status(config: &TriagoConfig) -> Result<()> {
    let store = FileRunStore::open(&config.run_store_path)?;
    let runs = store.list_runs()?;
    if runs.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }

    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    for run in &runs {
        let mark = match run.status {
            RunStatus::Succeeded => green.apply_to("✓"),
            RunStatus::Failed => red.apply_to("✗"),
        };
        match &run.outcome.error {
            Some(error) => println!(
                "{mark} {}  attempts={}  {}ms  error: {error}",
                run.run_id, run.attempts, run.duration_ms
            ),
            None => println!(
                "{mark} {}  attempts={}  {}ms",
                run.run_id, run.attempts, run.duration_ms
            ),
        }
    }
    Ok(())
}
