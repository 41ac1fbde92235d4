// Pipeline error taxonomy.
//
// Plumbing code (DB, config, IO) works in anyhow::Result. Anything that
// crosses the request pipeline boundary is converted into a PipelineError
// so callers can branch on the kind instead of on message text.

use thiserror::Error;

/// The distinguishable failure kinds of a generation or cloud request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Corpus below the minimum size; retry once more posts arrive.
    InsufficientData,
    /// The corpus fetch returned nothing at all.
    NoCorpus,
    /// The retry loop never sampled a single candidate.
    GenerationExhausted,
    /// A required local resource (font) is absent.
    ResourceMissing,
    /// A data-store or filesystem read failed.
    UpstreamIo,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InsufficientData => "insufficient-data",
            ErrorKind::NoCorpus => "no-corpus",
            ErrorKind::GenerationExhausted => "generation-exhausted",
            ErrorKind::ResourceMissing => "resource-missing",
            ErrorKind::UpstreamIo => "upstream-io-failure",
            ErrorKind::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("insufficient training data: {0}")]
    InsufficientData(String),

    #[error("no posts found in the database")]
    NoCorpus,

    #[error("failed to generate a sentence after {attempts} attempts")]
    GenerationExhausted { attempts: usize },

    #[error("required resource not found: {0}")]
    ResourceMissing(String),

    /// Read helpers log this kind and fail open; only the cloud handler
    /// surfaces it, when the rendered file cannot be read back.
    #[error("upstream I/O failure: {0}")]
    UpstreamIo(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InsufficientData(_) => ErrorKind::InsufficientData,
            PipelineError::NoCorpus => ErrorKind::NoCorpus,
            PipelineError::GenerationExhausted { .. } => ErrorKind::GenerationExhausted,
            PipelineError::ResourceMissing(_) => ErrorKind::ResourceMissing,
            PipelineError::UpstreamIo(_) => ErrorKind::UpstreamIo,
            PipelineError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}
