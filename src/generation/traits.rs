// Text model traits — swap-ready abstraction over the statistical model.
//
// The engine only trains a model on newline-separated token lines and asks
// it for sentences. The default implementation is the Markov chain in
// `markov.rs`; tests substitute scripted models.

use anyhow::Result;

/// Training parameters for a text model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    /// Number of preceding words each transition is conditioned on.
    pub state_size: usize,
    /// Keep the source text so sampled sentences that copy it can be rejected.
    pub retain_original: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            state_size: 2,
            retain_original: false,
        }
    }
}

/// A trained model that can sample sentences.
pub trait TextModel: Send {
    /// Sample one sentence of `min_words..=max_words` space-separated words,
    /// making up to `tries` internal attempts. `None` when every try failed.
    fn make_sentence(&mut self, tries: usize, min_words: usize, max_words: usize)
        -> Option<String>;
}

/// Builds a model from a training corpus.
pub trait ModelFactory: Send + Sync {
    /// Train on `corpus`: one sentence per line, words separated by spaces.
    fn train(&self, corpus: &str, config: ModelConfig) -> Result<Box<dyn TextModel>>;
}
