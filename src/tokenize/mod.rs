// Tokenize module — morphological analysis behind a swappable trait.

pub mod script;
pub mod traits;

pub use script::ScriptTokenizer;
pub use traits::{NounKind, TaggedToken, Tokenizer, WordClass};
