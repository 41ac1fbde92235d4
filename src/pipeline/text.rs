// Text pipeline: fetch corpus -> load forbidden words -> generate.
//
// Training and sampling are CPU-bound, so the engine runs on the blocking
// pool with cloned Arc handles. Each attempt it reports is written to the
// audit log afterwards.

use std::sync::Arc;

use anyhow::Context;
use serde_json::json;

use super::Services;
use crate::corpus::LexicalSet;
use crate::db::models::FORBIDDEN_KEY;
use crate::error::PipelineError;
use crate::generation::engine::{Attempt, AttemptOutcome};
use crate::generation::{Generated, Generator};

const SOURCE: &str = "text_generator";

impl Services {
    /// Generate one sentence from the stored posts.
    pub async fn generate_text(&self) -> Result<Generated, PipelineError> {
        let posts = self.loader.fetch(false).await;
        if posts.is_empty() {
            let err = PipelineError::NoCorpus;
            self.record_failure(SOURCE, &err).await;
            return Err(err);
        }

        let forbidden = LexicalSet::load(&self.db, &self.audit, FORBIDDEN_KEY).await;

        let factory = Arc::clone(&self.model_factory);
        let tokenizer = Arc::clone(&self.tokenizer);
        let settings = self.generation;
        let joined = tokio::task::spawn_blocking(move || {
            Generator::new(factory.as_ref(), tokenizer.as_ref())
                .with_settings(settings)
                .run(&posts, &forbidden)
        })
        .await
        .context("Text generation task panicked");
        let report = match joined {
            Ok(report) => report,
            Err(e) => {
                let err = PipelineError::from(e);
                self.record_failure(SOURCE, &err).await;
                return Err(err);
            }
        };

        for attempt in &report.attempts {
            self.record_attempt(attempt, settings.attempts).await;
        }

        match report.outcome {
            Ok(generated) if generated.degraded => {
                self.audit
                    .warning(
                        SOURCE,
                        format!(
                            "Returning unvalidated text after {} attempts",
                            settings.attempts
                        ),
                        Some(json!({
                            "degraded": true,
                            "text_length": generated.text.chars().count(),
                        })),
                    )
                    .await;
                Ok(generated)
            }
            Ok(generated) => {
                self.audit
                    .info(
                        SOURCE,
                        "Successfully generated Markov text",
                        Some(json!({
                            "text_length": generated.text.chars().count(),
                            "attempts": report.attempts.len(),
                        })),
                    )
                    .await;
                Ok(generated)
            }
            Err(err) => {
                self.record_failure(SOURCE, &err).await;
                Err(err)
            }
        }
    }

    async fn record_attempt(&self, attempt: &Attempt, budget: usize) {
        let n = attempt.number;
        match &attempt.outcome {
            AttemptOutcome::Accepted => {}
            AttemptOutcome::NoSample => {
                self.audit
                    .warning(
                        SOURCE,
                        format!("Model produced no sentence (attempt {n}/{budget})"),
                        None,
                    )
                    .await
            }
            AttemptOutcome::Invalid(reason) => {
                self.audit
                    .warning(
                        SOURCE,
                        format!("Generated text failed validation (attempt {n}/{budget})"),
                        Some(json!({ "reason": reason.to_string() })),
                    )
                    .await
            }
            AttemptOutcome::Forbidden(words) => {
                self.audit
                    .warning(
                        SOURCE,
                        format!("Generated text contains forbidden words (attempt {n}/{budget})"),
                        Some(json!({ "matched": words.len() })),
                    )
                    .await
            }
        }
    }
}
