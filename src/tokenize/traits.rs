// Tokenizer trait — the morphological analysis seam.
//
// The pipeline only needs two things from an analyzer: surface forms joined
// with spaces (for model training) and a coarse part-of-speech tag per token
// (for noun extraction). A dictionary-backed analyzer can be dropped in by
// implementing `tag`.

/// Sub-category of a noun token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NounKind {
    Common,
    Numeral,
    Symbol,
}

/// Grammatical category assigned to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordClass {
    Noun(NounKind),
    /// Verb or adjective stem (the kanji of 見上げた, 美味しい).
    Predicate,
    /// Hiragana ending glued to a predicate or verbal noun.
    Inflection,
    Particle,
    Symbol,
    Other,
}

impl WordClass {
    pub fn category(&self) -> &'static str {
        match self {
            WordClass::Noun(_) => "noun",
            WordClass::Predicate => "predicate",
            WordClass::Inflection => "inflection",
            WordClass::Particle => "particle",
            WordClass::Symbol => "symbol",
            WordClass::Other => "other",
        }
    }

    pub fn subcategory(&self) -> Option<&'static str> {
        match self {
            WordClass::Noun(NounKind::Common) => Some("common"),
            WordClass::Noun(NounKind::Numeral) => Some("numeral"),
            WordClass::Noun(NounKind::Symbol) => Some("symbol"),
            _ => None,
        }
    }
}

/// One analyzed token: its surface text and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub surface: String,
    pub class: WordClass,
}

impl TaggedToken {
    pub fn new(surface: impl Into<String>, class: WordClass) -> Self {
        Self {
            surface: surface.into(),
            class,
        }
    }
}

pub trait Tokenizer: Send + Sync {
    /// Analyze `text` into tagged tokens, unfiltered.
    fn tag(&self, text: &str) -> Vec<TaggedToken>;

    /// Surface forms of `text` joined by single spaces.
    ///
    /// Newlines become spaces and the ends are trimmed before analysis;
    /// empty and whitespace-only surfaces are dropped. Empty input gives an
    /// empty string.
    fn tokenize(&self, text: &str) -> String {
        let cleaned = text.trim().replace(['\r', '\n'], " ");
        if cleaned.is_empty() {
            return String::new();
        }

        self.tag(&cleaned)
            .into_iter()
            .map(|t| t.surface)
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
