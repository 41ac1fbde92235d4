// Script-run tokenizer — dictionary-free segmentation for Japanese text.
//
// Japanese has no spaces between words, but script changes are a strong
// boundary signal: content words are mostly kanji or katakana, while
// inflections and particles are hiragana. This tokenizer walks extended
// grapheme clusters (so emoji sequences and combining marks stay whole)
// and groups consecutive graphemes of the same script class into a token.
//
// A kanji run glued to hiragana is only a noun when the hiragana opens with
// a particle, a form of する or a name suffix. Otherwise the kanji is a
// verb or adjective stem: 見上げた gives 見上 (predicate) + げた.
//
// Coarser than a dictionary analyzer: "食べる" splits into "食" + "べる".

use unicode_segmentation::UnicodeSegmentation;

use super::traits::{NounKind, TaggedToken, Tokenizer, WordClass};

/// Marks a dictionary would file as symbol-like nouns (units, currency).
const SYMBOL_NOUNS: &[char] = &[
    '%', '％', '$', '＄', '¥', '￥', '℃', '°', '#', '＃', '㎏', '㎝', '㎞', '㍉', '㌔',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Kanji,
    Hiragana,
    Katakana,
    /// Any other alphabetic script (Latin, full-width Latin, Hangul, ...)
    Letter,
    Digit,
    Space,
    /// Punctuation, emoji and everything else; never merged.
    Mark,
}

fn classify(c: char) -> Script {
    match c {
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2FFFF}'
        | '々'
        | '〆'
        | '〇' => Script::Kanji,
        '\u{3041}'..='\u{309F}' => Script::Hiragana,
        '\u{30A1}'..='\u{30FA}'
        | '\u{30FC}'..='\u{30FE}'
        | '\u{31F0}'..='\u{31FF}'
        | '\u{FF66}'..='\u{FF9F}' => Script::Katakana,
        '0'..='9' | '\u{FF10}'..='\u{FF19}' => Script::Digit,
        c if c.is_whitespace() => Script::Space,
        c if c.is_alphabetic() => Script::Letter,
        _ => Script::Mark,
    }
}

/// Whether a grapheme of class `next` continues a run of class `current`.
fn continues(current: Script, next: Script) -> bool {
    match (current, next) {
        (Script::Mark, _) | (Script::Space, _) => false,
        // Alphanumeric words like "mp3" or "ver2" stay whole
        (Script::Letter, Script::Digit) => true,
        (a, b) => a == b,
    }
}

/// Hiragana openings after which the kanji before them reads as a noun.
const PARTICLE_OPENINGS: &[&str] = &[
    "から", "まで", "より", "だけ", "しか", "など", "じゃ", "は", "が", "を", "に", "で", "と", "の",
    "へ", "も", "や", "だ", "な", "か", "ね", "よ",
];

/// Forms of する; the kanji before them is a verbal noun (運動した).
const SURU_FORMS: &[&str] = &[
    "した", "して", "しま", "する", "すれ", "され", "させ", "しよう", "しな", "しろ", "しちゃ",
    "せず", "せよ",
];

const NOUN_SUFFIXES: &[&str] = &["さん", "ちゃん", "くん", "さま", "たち"];

/// Classes of a kanji run and the hiragana run directly after it.
fn tag_kanji_pair(ending: &str) -> (WordClass, WordClass) {
    let opens = |list: &[&str]| list.iter().any(|p| ending.starts_with(p));
    let noun = WordClass::Noun(NounKind::Common);
    if opens(NOUN_SUFFIXES) {
        (noun, WordClass::Other)
    } else if opens(SURU_FORMS) {
        (noun, WordClass::Inflection)
    } else if opens(PARTICLE_OPENINGS) {
        (noun, WordClass::Particle)
    } else {
        (WordClass::Predicate, WordClass::Inflection)
    }
}

fn tag_run(script: Script, surface: &str) -> WordClass {
    match script {
        Script::Kanji | Script::Katakana | Script::Letter => WordClass::Noun(NounKind::Common),
        Script::Digit => WordClass::Noun(NounKind::Numeral),
        Script::Hiragana => WordClass::Particle,
        Script::Mark => {
            let mut chars = surface.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if SYMBOL_NOUNS.contains(&c) => WordClass::Noun(NounKind::Symbol),
                _ => WordClass::Symbol,
            }
        }
        Script::Space => WordClass::Other,
    }
}

/// Tokenizer that segments on script boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptTokenizer;

impl ScriptTokenizer {
    pub fn new() -> Self {
        Self
    }
}

/// Consecutive graphemes grouped by script, whitespace included.
fn runs(text: &str) -> Vec<(Script, String)> {
    let mut runs: Vec<(Script, String)> = Vec::new();
    for grapheme in text.graphemes(true) {
        let Some(first) = grapheme.chars().next() else {
            continue;
        };
        let script = classify(first);
        match runs.last_mut() {
            // A letter run that absorbed digits keeps its Letter class
            Some((current, run)) if continues(*current, script) => run.push_str(grapheme),
            _ => runs.push((script, grapheme.to_string())),
        }
    }
    runs
}

impl Tokenizer for ScriptTokenizer {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let runs = runs(text);
        let mut tokens = Vec::with_capacity(runs.len());

        let mut i = 0;
        while i < runs.len() {
            let (script, surface) = &runs[i];
            match (script, runs.get(i + 1)) {
                (Script::Space, _) => i += 1,
                (Script::Kanji, Some((Script::Hiragana, ending))) => {
                    let (head, tail) = tag_kanji_pair(ending);
                    tokens.push(TaggedToken::new(surface.as_str(), head));
                    tokens.push(TaggedToken::new(ending.as_str(), tail));
                    i += 2;
                }
                _ => {
                    tokens.push(TaggedToken::new(surface.as_str(), tag_run(*script, surface)));
                    i += 1;
                }
            }
        }

        tokens
    }
}
