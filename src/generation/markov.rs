// Markov chain text model — order-N word transitions with weighted sampling.
//
// Training reads one sentence per line, pads each with begin markers and
// closes it with an end marker, and counts which word follows each run of
// `state_size` words. Sampling walks from the all-begin state, drawing each
// next word in proportion to its count, until the end marker comes up.
//
// Words are interned to u32 ids; successor lists keep first-seen order so a
// seeded chain replays the same walk on every run.

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::{bail, Result};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex_lite::Regex;
use tracing::debug;

use super::traits::{ModelConfig, ModelFactory, TextModel};

type WordId = u32;

const BEGIN: WordId = u32::MAX;
const END: WordId = u32::MAX - 1;

/// Upper bound on how much of a sampled sentence may copy the source text.
const MAX_OVERLAP_RATIO: f64 = 0.7;
const MAX_OVERLAP_TOTAL: usize = 15;

/// Input sentences with stray quotes or any brackets are skipped.
static ILL_FORMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^')|('$)|\s'|'\s|["()\[\]]"#).expect("static pattern compiles")
});

#[derive(Debug, Default)]
struct Successors {
    words: Vec<WordId>,
    counts: Vec<u32>,
    dist: Option<WeightedIndex<u32>>,
}

impl Successors {
    fn add(&mut self, word: WordId) {
        match self.words.iter().position(|w| *w == word) {
            Some(i) => self.counts[i] += 1,
            None => {
                self.words.push(word);
                self.counts.push(1);
            }
        }
    }

    fn seal(&mut self) {
        self.dist = WeightedIndex::new(&self.counts).ok();
    }
}

pub struct MarkovChain {
    state_size: usize,
    vocab: Vec<String>,
    transitions: HashMap<Vec<WordId>, Successors>,
    /// Space-joined training sentences, kept only with `retain_original`.
    source_text: Option<String>,
    rng: StdRng,
}

impl MarkovChain {
    /// Build a chain from newline-separated, space-tokenized sentences.
    pub fn build(corpus: &str, config: ModelConfig, rng: StdRng) -> Result<Self> {
        if config.state_size == 0 {
            bail!("state size must be at least 1");
        }

        let mut chain = Self {
            state_size: config.state_size,
            vocab: Vec::new(),
            transitions: HashMap::new(),
            source_text: None,
            rng,
        };
        let mut ids: HashMap<String, WordId> = HashMap::new();
        let mut kept: Vec<&str> = Vec::new();
        let mut skipped = 0usize;

        for line in corpus.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if ILL_FORMED.is_match(line) {
                skipped += 1;
                continue;
            }

            let mut items: Vec<WordId> = vec![BEGIN; config.state_size];
            for word in line.split_whitespace() {
                let next_id = chain.vocab.len() as WordId;
                let id = *ids.entry(word.to_string()).or_insert_with(|| {
                    chain.vocab.push(word.to_string());
                    next_id
                });
                items.push(id);
            }
            items.push(END);

            for window in items.windows(config.state_size + 1) {
                let (state, follow) = window.split_at(config.state_size);
                chain
                    .transitions
                    .entry(state.to_vec())
                    .or_default()
                    .add(follow[0]);
            }
            kept.push(line.trim());
        }

        for successors in chain.transitions.values_mut() {
            successors.seal();
        }
        if config.retain_original {
            chain.source_text = Some(
                kept.iter()
                    .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }

        debug!(
            sentences = kept.len(),
            skipped,
            states = chain.transitions.len(),
            vocabulary = chain.vocab.len(),
            "Built Markov chain"
        );
        Ok(chain)
    }

    /// Number of distinct states with at least one successor.
    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// One random walk from the begin state. `None` if it runs past `limit`
    /// words or reaches a state with no successors.
    fn walk(&mut self, limit: usize) -> Option<Vec<WordId>> {
        let mut state = vec![BEGIN; self.state_size];
        let mut words = Vec::new();

        loop {
            let successors = self.transitions.get(&state)?;
            let dist = successors.dist.as_ref()?;
            let next = successors.words[dist.sample(&mut self.rng)];
            if next == END {
                return Some(words);
            }
            if words.len() == limit {
                return None;
            }
            words.push(next);
            state.remove(0);
            state.push(next);
        }
    }

    /// Whether `words` copies too long a run of the source text.
    fn overlaps_source(&self, words: &[&str]) -> bool {
        let Some(source) = &self.source_text else {
            return false;
        };
        let ratio = (MAX_OVERLAP_RATIO * words.len() as f64).round_ties_even() as usize;
        let overlap_max = ratio.min(MAX_OVERLAP_TOTAL);
        let gram_len = overlap_max + 1;
        let gram_count = words.len().saturating_sub(overlap_max).max(1);

        (0..gram_count).any(|i| {
            let end = (i + gram_len).min(words.len());
            source.contains(&words[i..end].join(" "))
        })
    }
}

impl TextModel for MarkovChain {
    fn make_sentence(
        &mut self,
        tries: usize,
        min_words: usize,
        max_words: usize,
    ) -> Option<String> {
        for _ in 0..tries {
            let Some(ids) = self.walk(max_words) else {
                continue;
            };
            if ids.len() < min_words {
                continue;
            }
            let words: Vec<&str> = ids.iter().map(|id| self.vocab[*id as usize].as_str()).collect();
            if self.overlaps_source(&words) {
                continue;
            }
            return Some(words.join(" "));
        }
        None
    }
}

/// Builds `MarkovChain`s, optionally from a fixed RNG seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkovFactory {
    seed: Option<u64>,
}

impl MarkovFactory {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }
}

impl ModelFactory for MarkovFactory {
    fn train(&self, corpus: &str, config: ModelConfig) -> Result<Box<dyn TextModel>> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Box::new(MarkovChain::build(corpus, config, rng)?))
    }
}
