// Corpus module — fetching, filtering, and preparing posts.

pub mod lexicon;
pub mod loader;
pub mod preprocess;

pub use lexicon::LexicalSet;
pub use loader::CorpusLoader;
