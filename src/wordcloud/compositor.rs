// Word-cloud compositor — nouns in, PNG out, registry updated.
//
// Nouns are pulled from the tagged posts and filtered against the stop,
// forbidden and registry sets. The renderer runs on the blocking pool; the
// keys of the frequency map it rendered from are merged back into the
// registry so the next cloud shows different ones.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use super::font::FontLocator;
use super::registry::RegistryManager;
use super::renderer::{CloudOptions, CloudRenderer, RenderedWord};
use crate::corpus::LexicalSet;
use crate::error::PipelineError;
use crate::tokenize::{NounKind, TaggedToken, Tokenizer, WordClass};

/// Full-width punctuation and enclosing marks never shown in a cloud.
pub const EXCLUDED_MARKS: &[char] = &[
    '！', '？', '。', '、', '．', '，', '…', '‥', '：', '；', '｜', '＆', '＊', '（', '）', '［',
    '］', '｛', '｝', '「', '」', '『', '』', '【', '】', '＜', '＞', '〈', '〉', '《', '》', '〔',
    '〕', '・', '＋', '－', '＝', '／', '＼', '～', '①', '②', '③', '④', '⑤', '⑥', '⑦', '⑧',
    '⑨', '⑩',
];

/// Word sets a cloud must not show.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    pub stop_words: LexicalSet,
    pub forbidden: LexicalSet,
    pub registry: LexicalSet,
}

impl Exclusions {
    fn blocks(&self, word: &str) -> bool {
        self.stop_words.contains(word) || self.registry.contains(word) || self.forbidden.contains(word)
    }
}

/// Whether a tagged token may appear in a cloud.
pub fn is_eligible(token: &TaggedToken, exclusions: &Exclusions) -> bool {
    let word = token.surface.as_str();
    matches!(token.class, WordClass::Noun(NounKind::Common))
        && !word.trim().is_empty()
        && !exclusions.blocks(word)
        && word.chars().count() > 1
        && !word.is_ascii()
        && !word.contains(EXCLUDED_MARKS)
}

/// Eligible nouns of every post, in order, duplicates kept for counting.
pub fn extract_nouns(posts: &[String], tokenizer: &dyn Tokenizer, exclusions: &Exclusions) -> Vec<String> {
    posts
        .iter()
        .flat_map(|post| tokenizer.tag(post))
        .filter(|token| is_eligible(token, exclusions))
        .map(|token| token.surface)
        .collect()
}

/// A finished cloud.
#[derive(Debug, Clone)]
pub struct CloudResult {
    pub font_path: PathBuf,
    pub words: Vec<RenderedWord>,
    pub registry_updated: bool,
}

#[derive(Debug, Clone)]
pub enum CloudOutcome {
    Rendered(CloudResult),
    /// Nothing survived filtering; no file was written.
    NoEligibleWords,
}

#[derive(Clone)]
pub struct Compositor {
    tokenizer: Arc<dyn Tokenizer>,
    renderer: Arc<dyn CloudRenderer>,
    fonts: FontLocator,
    registry: RegistryManager,
    options: CloudOptions,
}

impl Compositor {
    pub fn new(
        tokenizer: Arc<dyn Tokenizer>,
        renderer: Arc<dyn CloudRenderer>,
        fonts: FontLocator,
        registry: RegistryManager,
    ) -> Self {
        Self {
            tokenizer,
            renderer,
            fonts,
            registry,
            options: CloudOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CloudOptions) -> Self {
        self.options = options;
        self
    }

    /// Render a cloud of `posts` to `output`.
    pub async fn render(
        &self,
        posts: &[String],
        exclusions: &Exclusions,
        output: &Path,
    ) -> Result<CloudOutcome, PipelineError> {
        let nouns = extract_nouns(posts, self.tokenizer.as_ref(), exclusions);
        if nouns.is_empty() {
            warn!(posts = posts.len(), "No eligible nouns for word cloud");
            return Ok(CloudOutcome::NoEligibleWords);
        }

        let font_path = self.fonts.locate().ok_or_else(|| {
            PipelineError::ResourceMissing("no font with Japanese coverage found".to_string())
        })?;

        let renderer = Arc::clone(&self.renderer);
        let text = nouns.join(" ");
        let options = self.options.clone();
        let output_path = output.to_path_buf();
        let render_font = font_path.clone();
        let words = tokio::task::spawn_blocking(move || {
            renderer.render(&text, &render_font, &output_path, &options)
        })
        .await
        .context("Word cloud render task panicked")??;

        let rendered: Vec<String> = words.iter().map(|w| w.word.clone()).collect();
        let registry_updated = self.registry.merge(&rendered).await;
        info!(
            nouns = nouns.len(),
            rendered = words.len(),
            registry_updated,
            "Composed word cloud"
        );

        Ok(CloudOutcome::Rendered(CloudResult {
            font_path,
            words,
            registry_updated,
        }))
    }
}
