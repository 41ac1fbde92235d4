// Request pipelines — the dependency bundle shared by every entry point.
//
// `Services` is built once at startup from a database handle and a set of
// collaborators, then shared behind an Arc by the HTTP handlers and the CLI.
// Nothing here is process-global: tests build their own bundle with fake
// collaborators.

use std::sync::Arc;

use serde_json::json;

use crate::audit::AuditLog;
use crate::config::Config;
use crate::corpus::CorpusLoader;
use crate::db::Database;
use crate::error::{ErrorKind, PipelineError};
use crate::generation::{GenerationSettings, MarkovFactory, ModelFactory};
use crate::tokenize::{ScriptTokenizer, Tokenizer};
use crate::wordcloud::{CloudRenderer, Compositor, FontLocator, RegistryManager, WordCloudRenderer};

pub mod cloud;
pub mod text;

/// The swappable parts of the pipeline.
#[derive(Clone)]
pub struct Collaborators {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub model_factory: Arc<dyn ModelFactory>,
    pub renderer: Arc<dyn CloudRenderer>,
    pub fonts: FontLocator,
}

impl Collaborators {
    /// Built-in implementations configured from the environment.
    pub fn from_config(config: &Config) -> Self {
        Self {
            tokenizer: Arc::new(ScriptTokenizer::new()),
            model_factory: Arc::new(MarkovFactory::new(config.model_seed)),
            renderer: Arc::new(WordCloudRenderer),
            fonts: FontLocator::new(config.font_path.clone()),
        }
    }
}

#[derive(Clone)]
pub struct Services {
    pub db: Arc<dyn Database>,
    pub audit: AuditLog,
    pub loader: CorpusLoader,
    pub registry: RegistryManager,
    pub compositor: Compositor,
    tokenizer: Arc<dyn Tokenizer>,
    model_factory: Arc<dyn ModelFactory>,
    generation: GenerationSettings,
}

impl Services {
    pub fn new(db: Arc<dyn Database>, collaborators: Collaborators) -> Self {
        let audit = AuditLog::new(db.clone());
        let registry = RegistryManager::new(db.clone(), audit.clone());
        let compositor = Compositor::new(
            collaborators.tokenizer.clone(),
            collaborators.renderer,
            collaborators.fonts,
            registry.clone(),
        );

        Self {
            loader: CorpusLoader::new(db.clone(), audit.clone()),
            db,
            audit,
            registry,
            compositor,
            tokenizer: collaborators.tokenizer,
            model_factory: collaborators.model_factory,
            generation: GenerationSettings::default(),
        }
    }

    pub fn with_generation_settings(mut self, settings: GenerationSettings) -> Self {
        self.generation = settings;
        self
    }

    /// Audit a failed request at the level its kind calls for.
    async fn record_failure(&self, source: &str, error: &PipelineError) {
        let kind = error.kind();
        let metadata = Some(json!({ "error_type": kind.as_str() }));
        match kind {
            ErrorKind::InsufficientData | ErrorKind::NoCorpus => {
                self.audit.warning(source, error.to_string(), metadata).await
            }
            _ => {
                self.audit
                    .error(source, format!("Error in {source}: {error}"), metadata)
                    .await
            }
        }
    }
}
