// Generation engine — train once, then sample under a bounded retry loop.
//
// Every sampled candidate goes through two gates:
// - structural validation (excluded script, ASCII-only tokens, minimum
//   length) is hard: a failing candidate is never returned on the happy path
// - the forbidden-word check is soft: after the retry budget runs out, the
//   last sampled candidate is returned anyway and flagged as degraded
//
// The engine is synchronous and writes nothing. It hands back a report of
// every attempt so the caller can audit-log them.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, warn};

use super::traits::{ModelConfig, ModelFactory};
use crate::corpus::preprocess::{self, contains_excluded_script, MIN_CORPUS_POSTS};
use crate::corpus::LexicalSet;
use crate::error::PipelineError;
use crate::tokenize::Tokenizer;

static ASCII_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("static pattern compiles"));

/// Knobs for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings {
    pub attempts: usize,
    /// Internal sampling tries per attempt.
    pub tries: usize,
    pub min_words: usize,
    pub max_words: usize,
    /// Minimum character length of the collapsed sentence.
    pub min_chars: usize,
    pub model: ModelConfig,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            attempts: 10,
            tries: 100,
            min_words: 5,
            max_words: 50,
            min_chars: 10,
            model: ModelConfig::default(),
        }
    }
}

/// Why a candidate failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    ExcludedScript,
    AsciiToken(String),
    TooShort { chars: usize },
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::ExcludedScript => f.write_str("contains excluded-script characters"),
            InvalidReason::AsciiToken(token) => write!(f, "contains ASCII-only token {token:?}"),
            InvalidReason::TooShort { chars } => write!(f, "too short ({chars} chars)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The model produced nothing within its tries.
    NoSample,
    Invalid(InvalidReason),
    /// Valid, but contains these forbidden words.
    Forbidden(Vec<String>),
    Accepted,
}

/// One pass of the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: usize,
    /// Collapsed candidate, when one was sampled.
    pub candidate: Option<String>,
    pub outcome: AttemptOutcome,
}

/// A sentence handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    /// True when no candidate passed every gate and the last sampled one
    /// was returned as a fallback.
    pub degraded: bool,
}

/// Everything a run did: the attempt trail and the final result.
#[derive(Debug)]
pub struct GenerationReport {
    pub attempts: Vec<Attempt>,
    pub outcome: Result<Generated, PipelineError>,
}

impl GenerationReport {
    fn failed(error: PipelineError) -> Self {
        Self {
            attempts: Vec::new(),
            outcome: Err(error),
        }
    }
}

/// Remove all whitespace, giving the output form of a candidate.
pub fn collapse(candidate: &str) -> String {
    candidate.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Structural checks on a space-separated candidate.
pub fn validate(candidate: &str, min_chars: usize) -> Result<(), InvalidReason> {
    if contains_excluded_script(candidate) {
        return Err(InvalidReason::ExcludedScript);
    }
    if let Some(token) = candidate
        .split_whitespace()
        .find(|t| ASCII_TOKEN.is_match(t))
    {
        return Err(InvalidReason::AsciiToken(token.to_string()));
    }
    let chars = collapse(candidate).chars().count();
    if chars < min_chars {
        return Err(InvalidReason::TooShort { chars });
    }
    Ok(())
}

pub struct Generator<'a> {
    factory: &'a dyn ModelFactory,
    tokenizer: &'a dyn Tokenizer,
    settings: GenerationSettings,
}

impl<'a> Generator<'a> {
    pub fn new(factory: &'a dyn ModelFactory, tokenizer: &'a dyn Tokenizer) -> Self {
        Self {
            factory,
            tokenizer,
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Generate one sentence, discarding the attempt trail.
    pub fn generate(&self, posts: &[String], forbidden: &LexicalSet) -> Result<String, PipelineError> {
        self.run(posts, forbidden).outcome.map(|g| g.text)
    }

    /// Generate one sentence and report every attempt.
    pub fn run(&self, posts: &[String], forbidden: &LexicalSet) -> GenerationReport {
        if posts.len() < MIN_CORPUS_POSTS {
            return GenerationReport::failed(PipelineError::InsufficientData(format!(
                "{} posts available, at least {MIN_CORPUS_POSTS} required",
                posts.len()
            )));
        }

        let lines = match preprocess::prepare(posts, self.tokenizer) {
            Ok(lines) => lines,
            Err(e) => return GenerationReport::failed(e),
        };

        let mut model = match self.factory.train(&lines.join("\n"), self.settings.model) {
            Ok(model) => model,
            Err(e) => return GenerationReport::failed(PipelineError::Unexpected(e)),
        };

        let s = self.settings;
        let mut attempts = Vec::with_capacity(s.attempts);
        let mut last_candidate: Option<String> = None;

        for number in 1..=s.attempts {
            let Some(sampled) = model.make_sentence(s.tries, s.min_words, s.max_words) else {
                debug!(attempt = number, "Model produced no sentence");
                attempts.push(Attempt {
                    number,
                    candidate: None,
                    outcome: AttemptOutcome::NoSample,
                });
                continue;
            };

            let collapsed = collapse(&sampled);
            last_candidate = Some(collapsed.clone());

            let outcome = match validate(&sampled, s.min_chars) {
                Err(reason) => AttemptOutcome::Invalid(reason),
                Ok(()) if forbidden.contains_any(&collapsed) => AttemptOutcome::Forbidden(
                    forbidden.matches_in(&collapsed).map(str::to_string).collect(),
                ),
                Ok(()) => AttemptOutcome::Accepted,
            };
            debug!(attempt = number, ?outcome, "Sampled candidate");

            let accepted = outcome == AttemptOutcome::Accepted;
            attempts.push(Attempt {
                number,
                candidate: Some(collapsed.clone()),
                outcome,
            });
            if accepted {
                return GenerationReport {
                    attempts,
                    outcome: Ok(Generated {
                        text: collapsed,
                        degraded: false,
                    }),
                };
            }
        }

        let outcome = match last_candidate {
            Some(text) => {
                warn!(
                    attempts = s.attempts,
                    "No clean sentence generated; returning last candidate"
                );
                Ok(Generated {
                    text,
                    degraded: true,
                })
            }
            None => Err(PipelineError::GenerationExhausted {
                attempts: s.attempts,
            }),
        };
        GenerationReport { attempts, outcome }
    }
}
