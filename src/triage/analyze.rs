//! Best-effort AI triage of a ticket.
//!
//! The model call lives outside the durable-step boundary: it is a plain
//! operation with its own local error handling, never a memoized step.
//! Every failure mode (no client, transport error, empty or unparsable
//! reply) is trapped here and reported as "no data".

use std::sync::Arc;

use tracing::warn;

use super::parse::{TriageResult, parse_triage};
use crate::gemini::{ContentGenerator, GenerateRequest};

const SYSTEM_PROMPT: &str = "You are an expert AI assistant that processes technical support tickets.\n\n\
Your job is to:\n\
1. Summarize the issue.\n\
2. Estimate its priority.\n\
3. Provide helpful notes and resource links for human moderators.\n\
4. List relevant technical skills required.\n\n\
IMPORTANT:\n\
- Respond with *only* valid raw JSON.\n\
- Do NOT include markdown, code fences, comments, or any extra formatting.\n\
- The format must be a raw JSON object.";

fn user_prompt(title: &str, description: &str) -> String {
    format!(
        "Analyze the following support ticket and provide a JSON object with:\n\n\
         - summary: A short 1-2 sentence summary of the issue.\n\
         - priority: One of \"low\", \"medium\", or \"high\".\n\
         - helpfulNotes: A detailed technical explanation that a moderator can use to solve this issue.\n\
         - relatedSkills: An array of relevant skills required to solve the issue (e.g., [\"React\", \"MongoDB\"]).\n\n\
         Respond ONLY with that JSON object and no other text or markdown.\n\n\
         ---\n\n\
         Ticket information:\n\n\
         - Title: {title}\n\
         - Description: {description}"
    )
}

/// Wraps the model client and turns a ticket into optional triage data.
pub struct TriageAnalyzer {
    client: Option<Arc<dyn ContentGenerator>>,
}

impl TriageAnalyzer {
    pub fn new(client: Arc<dyn ContentGenerator>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Analyzer without a model client; every analysis yields no data and
    /// the ticket is left for manual triage.
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub async fn analyze(&self, title: &str, description: &str) -> Option<TriageResult> {
        let Some(client) = &self.client else {
            warn!("no model client configured, skipping AI analysis");
            return None;
        };

        let req = GenerateRequest::from_prompt(SYSTEM_PROMPT, &user_prompt(title, description));
        let response = match client.generate(&req).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "AI analysis failed, continuing without triage data");
                return None;
            }
        };

        let Some(text) = response.text() else {
            warn!("model reply contained no text");
            return None;
        };

        let parsed = parse_triage(&text);
        if parsed.is_none() {
            warn!("model reply was not parseable triage data");
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeminiError;
    use crate::gemini::types::{Candidate, Content, GenerateResponse, Part};
    use crate::model::Priority;
    use async_trait::async_trait;

    struct MockGenerator {
        reply: Result<String, ()>,
    }

    impl MockGenerator {
        fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
            }
        }

        fn err() -> Self {
            Self { reply: Err(()) }
        }
    }

    #[async_trait]
    impl ContentGenerator for MockGenerator {
        async fn generate(&self, _req: &GenerateRequest) -> Result<GenerateResponse, GeminiError> {
            match &self.reply {
                Ok(text) => Ok(GenerateResponse {
                    candidates: vec![Candidate {
                        content: Some(Content {
                            role: Some("model".into()),
                            parts: vec![Part { text: text.clone() }],
                        }),
                        finish_reason: Some("STOP".into()),
                    }],
                    usage_metadata: None,
                }),
                Err(()) => Err(GeminiError::ApiError {
                    status: 500,
                    message: "mock error".into(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn analyze_parses_fenced_reply() {
        let analyzer = TriageAnalyzer::new(Arc::new(MockGenerator::ok(
            "```json\n{\"summary\":\"s\",\"priority\":\"high\",\"relatedSkills\":[\"Rust\"]}\n```",
        )));
        let result = analyzer.analyze("T", "D").await.unwrap();
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.related_skills, vec!["Rust".to_string()]);
    }

    #[tokio::test]
    async fn analyze_swallows_api_errors() {
        let analyzer = TriageAnalyzer::new(Arc::new(MockGenerator::err()));
        assert_eq!(analyzer.analyze("T", "D").await, None);
    }

    #[tokio::test]
    async fn analyze_swallows_unparsable_replies() {
        let analyzer = TriageAnalyzer::new(Arc::new(MockGenerator::ok("I cannot help with that")));
        assert_eq!(analyzer.analyze("T", "D").await, None);
    }

    #[tokio::test]
    async fn disabled_analyzer_yields_no_data() {
        let analyzer = TriageAnalyzer::disabled();
        assert_eq!(analyzer.analyze("T", "D").await, None);
    }
}
