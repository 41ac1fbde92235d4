// Word-cloud pipeline: recent posts -> exclusion sets -> compositor.

use std::path::Path;

use serde_json::json;

use super::Services;
use crate::corpus::LexicalSet;
use crate::db::models::{FORBIDDEN_KEY, STOP_WORDS_KEY};
use crate::error::PipelineError;
use crate::wordcloud::{CloudOutcome, Exclusions};

const SOURCE: &str = "wordcloud";

/// Words shown in the success log entry.
const SAMPLE_WORDS: usize = 5;

impl Services {
    /// Render a cloud of the last four hours of posts to `output`.
    pub async fn render_wordcloud(&self, output: &Path) -> Result<CloudOutcome, PipelineError> {
        let posts = self.loader.fetch(true).await;
        if posts.is_empty() {
            let err = PipelineError::NoCorpus;
            self.record_failure(SOURCE, &err).await;
            return Err(err);
        }

        let exclusions = Exclusions {
            stop_words: LexicalSet::load(&self.db, &self.audit, STOP_WORDS_KEY).await,
            forbidden: LexicalSet::load(&self.db, &self.audit, FORBIDDEN_KEY).await,
            registry: self.registry.load().await.to_lexical_set(),
        };

        let outcome = match self.compositor.render(&posts, &exclusions, output).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.record_failure(SOURCE, &err).await;
                return Err(err);
            }
        };

        match &outcome {
            CloudOutcome::NoEligibleWords => {
                self.audit
                    .warning(
                        SOURCE,
                        "No valid words found for wordcloud",
                        Some(json!({ "posts": posts.len() })),
                    )
                    .await;
            }
            CloudOutcome::Rendered(result) => {
                let sample: Vec<&str> = result
                    .words
                    .iter()
                    .take(SAMPLE_WORDS)
                    .map(|w| w.word.as_str())
                    .collect();
                self.audit
                    .info(
                        SOURCE,
                        "Wordcloud generated successfully",
                        Some(json!({
                            "font_path": result.font_path.display().to_string(),
                            "word_count": result.words.len(),
                            "sample_words": sample,
                        })),
                    )
                    .await;

                let updated = result.words.len();
                if result.registry_updated {
                    self.audit
                        .info(
                            SOURCE,
                            format!("Updated wordcloud registry with {updated} words"),
                            Some(json!({ "updated_words": updated })),
                        )
                        .await;
                } else {
                    self.audit
                        .warning(
                            SOURCE,
                            "Failed to update wordcloud registry",
                            Some(json!({ "updated_words": 0 })),
                        )
                        .await;
                }
            }
        }

        Ok(outcome)
    }
}
