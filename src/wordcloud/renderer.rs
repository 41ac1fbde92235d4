// Cloud renderer — weighted words onto a PNG canvas.
//
// Layout is delegated to the `wcloud` crate. The renderer hands back the
// frequency map it rendered from; those keys are what the registry records.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ab_glyph::FontVec;
use anyhow::{bail, Context, Result};
use image::{ImageFormat, Rgba};
use tracing::debug;
use wcloud::{Tokenizer as CloudTokenizer, WordCloud, WordCloudSize};

/// Fixed layout parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudOptions {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
    pub seed: u64,
    /// Probability that a word is laid out horizontally.
    pub prefer_horizontal: f64,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub max_words: u32,
    /// How much relative frequency drives font size (0 = rank only).
    pub relative_scaling: f32,
}

impl Default for CloudOptions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 520,
            background: [255, 255, 255],
            seed: 42,
            prefer_horizontal: 0.7,
            min_font_size: 12.0,
            max_font_size: 80.0,
            max_words: 200,
            relative_scaling: 0.5,
        }
    }
}

/// One entry of the frequency map a cloud was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWord {
    pub word: String,
    /// Frequency relative to the most frequent word (0, 1].
    pub weight: f32,
}

pub trait CloudRenderer: Send + Sync {
    /// Render the word frequencies of space-separated `text` to a PNG at
    /// `output` using the font at `font_path`. Returns the frequency map,
    /// most frequent first.
    fn render(
        &self,
        text: &str,
        font_path: &Path,
        output: &Path,
        options: &CloudOptions,
    ) -> Result<Vec<RenderedWord>>;
}

/// Count space-separated words and keep the `max_words` most frequent,
/// normalised by the top count. Ties keep first-seen order; no case or
/// plural folding.
pub fn word_frequencies(text: &str, max_words: usize) -> Vec<(String, f32)> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, word) in text.split_whitespace().enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(max_words);

    let Some(top) = ranked.first().map(|r| r.1 as f32) else {
        return Vec::new();
    };
    ranked
        .into_iter()
        .map(|(word, count, _)| (word.to_string(), count as f32 / top))
        .collect()
}

/// Renderer backed by `wcloud`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCloudRenderer;

impl CloudRenderer for WordCloudRenderer {
    fn render(
        &self,
        text: &str,
        font_path: &Path,
        output: &Path,
        options: &CloudOptions,
    ) -> Result<Vec<RenderedWord>> {
        let frequencies = word_frequencies(text, options.max_words as usize);
        if frequencies.is_empty() {
            bail!("No words to render");
        }

        // wcloud panics on an unreadable font; check it here so it surfaces as an error
        let data = std::fs::read(font_path)
            .with_context(|| format!("Failed to read font {}", font_path.display()))?;
        FontVec::try_from_vec(data)
            .with_context(|| format!("Unsupported font file {}", font_path.display()))?;

        // Input is pre-tokenized; the crate's English stop list must not apply
        let tokenizer = CloudTokenizer::default()
            .with_max_words(options.max_words)
            .with_filter(HashSet::new());
        let [r, g, b] = options.background;
        let cloud = WordCloud::default()
            .with_tokenizer(tokenizer)
            .with_font_from_path(font_path.to_path_buf())
            .with_background_color(Rgba([r, g, b, 255]))
            .with_min_font_size(options.min_font_size)
            .with_max_font_size(Some(options.max_font_size))
            .with_relative_font_scaling(options.relative_scaling)
            .with_word_rotate_chance(1.0 - options.prefer_horizontal)
            .with_rng_seed(options.seed);

        let size = WordCloudSize::FromDimensions {
            width: options.width,
            height: options.height,
        };
        cloud
            .generate_from_text(text, size, 1.0)
            .save_with_format(output, ImageFormat::Png)
            .with_context(|| format!("Failed to write word cloud to {}", output.display()))?;

        debug!(words = frequencies.len(), "Rendered word cloud");
        Ok(frequencies
            .into_iter()
            .map(|(word, weight)| RenderedWord { word, weight })
            .collect())
    }
}
