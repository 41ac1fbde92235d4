// Text preprocessing — raw posts to model-ready training lines.
//
// Each post is checked independently: posts carrying characters specific to
// written Chinese are dropped to keep the corpus monolingual, short posts
// are dropped, the sentence terminal is ensured, and the post is tokenized.
// Lengths are counted in characters, not bytes.

use tracing::debug;

use crate::error::PipelineError;
use crate::tokenize::Tokenizer;

/// Minimum number of posts (raw or prepared) a training run needs.
pub const MIN_CORPUS_POSTS: usize = 10;

/// Minimum character length of a trimmed post and of its tokenized form.
pub const MIN_POST_CHARS: usize = 10;

/// Japanese full stop appended to posts lacking it.
pub const SENTENCE_TERMINAL: char = '。';

/// Simplified-Chinese characters that rarely occur in Japanese text.
pub const EXCLUDED_SCRIPT_CHARS: &[char] = &[
    '读', '难', '书', '说', '谢', '对', '话', '吗', '吧', '们', '这', '你', '她', '很', '给',
];

/// Whether `text` contains any excluded-script character.
pub fn contains_excluded_script(text: &str) -> bool {
    text.contains(EXCLUDED_SCRIPT_CHARS)
}

/// Prepare one post, or `None` if it is rejected.
pub fn prepare_post(post: &str, tokenizer: &dyn Tokenizer) -> Option<String> {
    if contains_excluded_script(post) {
        return None;
    }

    let trimmed = post.trim();
    if trimmed.chars().count() <= MIN_POST_CHARS {
        return None;
    }

    let terminated = if trimmed.ends_with(SENTENCE_TERMINAL) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{SENTENCE_TERMINAL}")
    };

    let tokens = tokenizer.tokenize(&terminated);
    if tokens.is_empty() || tokens.chars().count() < MIN_POST_CHARS {
        return None;
    }
    Some(tokens)
}

/// Prepare a corpus for training.
///
/// Returns the accepted token lines in input order, or `InsufficientData`
/// when fewer than ten survive or their newline join is blank.
pub fn prepare(posts: &[String], tokenizer: &dyn Tokenizer) -> Result<Vec<String>, PipelineError> {
    let lines: Vec<String> = posts
        .iter()
        .filter_map(|p| prepare_post(p, tokenizer))
        .collect();

    debug!(
        input = posts.len(),
        accepted = lines.len(),
        "Preprocessed corpus"
    );

    if lines.len() < MIN_CORPUS_POSTS {
        return Err(PipelineError::InsufficientData(format!(
            "only {} of {} posts usable after preprocessing",
            lines.len(),
            posts.len()
        )));
    }

    if lines.join("\n").trim().is_empty() {
        return Err(PipelineError::InsufficientData(
            "corpus is empty after preprocessing".to_string(),
        ));
    }

    Ok(lines)
}
