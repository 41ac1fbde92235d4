// Word-cloud module — noun extraction, layout, and the used-words registry.

pub mod compositor;
pub mod font;
pub mod registry;
pub mod renderer;

pub use compositor::{CloudOutcome, CloudResult, Compositor, Exclusions};
pub use font::FontLocator;
pub use registry::{Registry, RegistryManager, REGISTRY_CAPACITY};
pub use renderer::{CloudOptions, CloudRenderer, RenderedWord, WordCloudRenderer};
