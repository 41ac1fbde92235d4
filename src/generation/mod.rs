// Generation module — statistical text model and the validating retry loop.

pub mod engine;
pub mod markov;
pub mod traits;

pub use engine::{Generated, GenerationReport, GenerationSettings, Generator};
pub use markov::MarkovFactory;
pub use traits::{ModelConfig, ModelFactory, TextModel};
