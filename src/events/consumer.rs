use std::sync::Arc;

use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::types::{Event, FromEvent};
use crate::engine::{Engine, RunRecord, Workflow};

/// Subscription loop binding one workflow to the event bus. Each
/// matching delivery starts one independent engine run; runs for
/// different events proceed in parallel.
pub struct EventConsumer<W: Workflow> {
    engine: Engine,
    workflow: Arc<W>,
    rx: Receiver<Event>,
}

impl<W> EventConsumer<W>
where
    W: Workflow + 'static,
    W::Event: FromEvent + Clone + 'static,
{
    pub fn new(engine: Engine, workflow: Arc<W>, rx: Receiver<Event>) -> Self {
        Self {
            engine,
            workflow,
            rx,
        }
    }

    /// Consume events until the bus closes, spawning one run per
    /// matching delivery. Lagged deliveries are logged and skipped; the
    /// transport is at-least-once, not lossless under backpressure.
    pub async fn run(mut self) {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    let Some(payload) = W::Event::from_event(&event) else {
                        continue;
                    };
                    let payload = payload.clone();
                    let engine = self.engine.clone();
                    let workflow = Arc::clone(&self.workflow);
                    tokio::spawn(async move {
                        engine.execute(workflow.as_ref(), &payload).await;
                    });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event consumer lagged, deliveries were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    /// Receive the next matching event and execute its run inline.
    /// Returns `None` once the bus closes. Used by the CLI paths, which
    /// want the run record of the event they just published.
    pub async fn process_next(&mut self) -> Option<RunRecord> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    let Some(payload) = W::Event::from_event(&event) else {
                        continue;
                    };
                    let payload = payload.clone();
                    return Some(self.engine.execute(self.workflow.as_ref(), &payload).await);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event consumer lagged, deliveries were dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{InMemoryRunStore, RetryConfig, RunStatus, RunStore, StepError, StepRunner};
    use crate::events::bus::EventBus;
    use crate::events::types::UserSignedUp;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingWorkflow {
        runs: AtomicU32,
    }

    #[async_trait]
    impl Workflow for CountingWorkflow {
        type Event = UserSignedUp;

        fn id(&self) -> &'static str {
            "counting"
        }

        fn run_key(&self, event: &UserSignedUp) -> String {
            event.email.clone()
        }

        async fn run(&self, _step: &mut StepRunner, _event: &UserSignedUp) -> Result<(), StepError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn setup() -> (Engine, Arc<InMemoryRunStore>, Arc<CountingWorkflow>) {
        let store = Arc::new(InMemoryRunStore::new());
        let engine = Engine::new(
            Arc::clone(&store) as Arc<dyn RunStore>,
            RetryConfig {
                max_retries: 0,
                base_delay_ms: 1,
            },
        );
        let workflow = Arc::new(CountingWorkflow {
            runs: AtomicU32::new(0),
        });
        (engine, store, workflow)
    }

    fn signup(email: &str) -> Event {
        Event::UserSignedUp(UserSignedUp {
            email: email.into(),
            emitted_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn process_next_skips_foreign_events_and_returns_record() {
        let (engine, _, workflow) = setup();
        let bus = EventBus::new();
        let mut consumer = EventConsumer::new(engine, Arc::clone(&workflow), bus.subscribe());

        bus.publish(Event::TicketCreated(crate::events::types::TicketCreated {
            ticket_id: "t-1".into(),
            title: "t".into(),
            description: "d".into(),
            created_by: "u".into(),
            emitted_at: Utc::now(),
        }))
        .unwrap();
        bus.publish(signup("a@example.com")).unwrap();

        let record = consumer.process_next().await.unwrap();
        assert_eq!(record.status, RunStatus::Succeeded);
        assert_eq!(record.run_id, "counting:a@example.com");
        assert_eq!(workflow.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn process_next_returns_none_when_bus_closes() {
        let (engine, _, workflow) = setup();
        let bus = EventBus::new();
        let mut consumer = EventConsumer::new(engine, workflow, bus.subscribe());
        drop(bus);
        assert!(consumer.process_next().await.is_none());
    }

    #[tokio::test]
    async fn run_spawns_a_run_per_delivery() {
        let (engine, store, workflow) = setup();
        let bus = EventBus::new();
        let consumer = EventConsumer::new(engine, Arc::clone(&workflow), bus.subscribe());
        let handle = tokio::spawn(consumer.run());

        bus.publish(signup("a@example.com")).unwrap();
        bus.publish(signup("b@example.com")).unwrap();
        drop(bus);
        handle.await.unwrap();

        // Spawned runs may still be finishing after the loop exits.
        for _ in 0..50 {
            if store.list_runs().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(store.list_runs().unwrap().len(), 2);
        assert_eq!(workflow.runs.load(Ordering::SeqCst), 2);
    }
}
