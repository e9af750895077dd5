//! Welcome-mail workflow, triggered once per `user.signup`.
//!
//! Two steps: load the user, send the welcome mail. Unlike the advisory
//! notification in the triage pipeline, the mail here IS the point of
//! the run, so delivery failures are retriable rather than swallowed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::{StepError, StepRunner, Workflow};
use crate::events::UserSignedUp;
use crate::mailer::MailSender;
use crate::model::User;
use crate::store::{UserFilter, UserStore};

fn retriable(e: impl std::fmt::Display) -> StepError {
    StepError::Retriable(e.to_string())
}

pub struct SignupWelcome {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn MailSender>,
}

impl SignupWelcome {
    pub fn new(users: Arc<dyn UserStore>, mailer: Arc<dyn MailSender>) -> Self {
        Self { users, mailer }
    }
}

#[async_trait]
impl Workflow for SignupWelcome {
    type Event = UserSignedUp;

    fn id(&self) -> &'static str {
        "on-user-signup"
    }

    fn run_key(&self, event: &UserSignedUp) -> String {
        event.email.clone()
    }

    async fn run(&self, step: &mut StepRunner, event: &UserSignedUp) -> Result<(), StepError> {
        let user: User = step
            .run("get-user-email", || async {
                self.users
                    .find_one(&UserFilter::email(&event.email))
                    .await
                    .map_err(retriable)?
                    .ok_or_else(|| {
                        StepError::Fatal(format!("user with email {} not found", event.email))
                    })
            })
            .await?;

        step.run("send-welcome-email", || async {
            let subject = "Welcome to the Ticketing System";
            let body = format!(
                "Hello {},\n\nThank you for signing up! We're excited to have you on board.\n\n\
                 Best regards,\nTicketing System Team",
                user.email
            );
            self.mailer
                .send(&user.email, subject, &body)
                .await
                .map_err(retriable)
        })
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, InMemoryRunStore, RetryConfig, RunStatus, RunStore};
    use crate::mailer::MailError;
    use crate::model::Role;
    use crate::store::MemoryUserStore;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyMailer {
        failures: AtomicU32,
        sent: AtomicU32,
    }

    impl FlakyMailer {
        fn new(failures: u32) -> Self {
            Self {
                failures: AtomicU32::new(failures),
                sent: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MailSender for FlakyMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), MailError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(MailError::ApiError {
                    status: 503,
                    message: "relay unavailable".into(),
                });
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn users() -> Arc<MemoryUserStore> {
        Arc::new(MemoryUserStore::seeded(vec![User {
            id: "u-1".into(),
            email: "new@example.com".into(),
            role: Role::User,
            skills: Vec::new(),
        }]))
    }

    fn engine() -> Engine {
        Engine::new(
            Arc::new(InMemoryRunStore::new()) as Arc<dyn RunStore>,
            RetryConfig {
                max_retries: 2,
                base_delay_ms: 1,
            },
        )
    }

    fn event(email: &str) -> UserSignedUp {
        UserSignedUp {
            email: email.into(),
            emitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sends_welcome_mail_once() {
        let mailer = Arc::new(FlakyMailer::new(0));
        let workflow = SignupWelcome::new(users(), mailer.clone());
        let record = engine().execute(&workflow, &event("new@example.com")).await;

        assert_eq!(record.status, RunStatus::Succeeded);
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_user_is_fatal() {
        let workflow = SignupWelcome::new(users(), Arc::new(FlakyMailer::new(0)));
        let record = engine().execute(&workflow, &event("ghost@example.com")).await;

        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.attempts, 1);
        assert!(record.outcome.error.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn mail_failure_retries_and_then_delivers() {
        let mailer = Arc::new(FlakyMailer::new(1));
        let workflow = SignupWelcome::new(users(), mailer.clone());
        let record = engine().execute(&workflow, &event("new@example.com")).await;

        assert_eq!(record.status, RunStatus::Succeeded);
        assert_eq!(record.attempts, 2);
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
        // get-user-email ran once; the retry replayed its memo.
        let fetch = record.steps.iter().find(|s| s.name == "get-user-email").unwrap();
        assert_eq!(fetch.attempts, 1);
    }

    #[tokio::test]
    async fn mail_failure_exhausts_retries() {
        let mailer = Arc::new(FlakyMailer::new(u32::MAX));
        let workflow = SignupWelcome::new(users(), mailer.clone());
        let record = engine().execute(&workflow, &event("new@example.com")).await;

        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.attempts, 3);
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 0);
    }
}
