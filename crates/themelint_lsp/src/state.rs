//! Server state shared by all handlers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tower_lsp::Client;
use tracing::{error, info};

use themelint_core::{
    CheckRegistry, CheckRunner, DocsetSnapshot, LinterConfig, ThemeDocset,
};

use crate::diagnostics::{DiagnosticsManager, DiagnosticsPublisher};
use crate::dispatcher::CheckDispatcher;
use crate::documents::DocumentManager;
use crate::scheduler::{DEFAULT_DELAY, RunScheduler};

/// Default time allowed for the docset to answer before a run proceeds
/// without it.
pub const DEFAULT_DOCSET_TIMEOUT: Duration = Duration::from_secs(2);

/// Checks and docset built from one configuration.
#[derive(Clone)]
pub struct Engine {
    pub runner: Arc<CheckRunner>,
    pub docset: Option<Arc<dyn ThemeDocset>>,
    pub docset_timeout: Duration,
    pub debounce: Duration,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("checks", &self.runner.checks().len())
            .field("docset", &self.docset.is_some())
            .field("docset_timeout", &self.docset_timeout)
            .field("debounce", &self.debounce)
            .finish()
    }
}

impl Engine {
    pub fn new(runner: CheckRunner) -> Self {
        Self {
            runner: Arc::new(runner),
            docset: None,
            docset_timeout: DEFAULT_DOCSET_TIMEOUT,
            debounce: DEFAULT_DELAY,
        }
    }

    pub fn with_docset(mut self, docset: Arc<dyn ThemeDocset>) -> Self {
        self.docset = Some(docset);
        self
    }

    /// Builds the engine for `config`.
    ///
    /// Problems are logged and the affected part falls back to defaults, so
    /// a broken config never stops the server.
    pub fn from_config(registry: &CheckRegistry, config: &LinterConfig) -> Self {
        let runner = CheckRunner::from_config(registry, config).unwrap_or_else(|e| {
            error!("Ignoring invalid ignore patterns: {}", e);
            CheckRunner::new(registry.active_checks(config))
        });

        let docset = config.docset_path().and_then(|path| {
            match DocsetSnapshot::from_file(&path) {
                Ok(snapshot) => {
                    info!("Loaded docset from {}", path.display());
                    Some(Arc::new(snapshot) as Arc<dyn ThemeDocset>)
                }
                Err(e) => {
                    error!("Failed to load docset: {}", e);
                    None
                }
            }
        });

        Self {
            runner: Arc::new(runner),
            docset,
            docset_timeout: config.docset_timeout(),
            debounce: config.debounce(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::from_config(&CheckRegistry::builtin(), &LinterConfig::new())
    }
}

/// Everything the handlers work on.
pub struct ServerState<P> {
    pub documents: Arc<DocumentManager>,
    pub diagnostics: Arc<DiagnosticsManager<P>>,
    pub dispatcher: Arc<CheckDispatcher<P>>,
    pub scheduler: RunScheduler<Arc<CheckDispatcher<P>>>,
}

impl<P> fmt::Debug for ServerState<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerState")
            .field("documents", &self.documents)
            .finish_non_exhaustive()
    }
}

impl<P: DiagnosticsPublisher> ServerState<P> {
    pub fn new(publisher: P, engine: Engine) -> Self {
        let documents = Arc::new(DocumentManager::new());
        let diagnostics = Arc::new(DiagnosticsManager::new(publisher));
        let delay = engine.debounce;
        let dispatcher = Arc::new(CheckDispatcher::new(
            Arc::clone(&documents),
            Arc::clone(&diagnostics),
            engine,
        ));
        let scheduler = RunScheduler::new(Arc::clone(&dispatcher), delay);

        Self {
            documents,
            diagnostics,
            dispatcher,
            scheduler,
        }
    }

    /// Swaps in a new engine and debounce delay.
    pub fn set_engine(&self, engine: Engine) {
        self.scheduler.set_delay(engine.debounce);
        self.dispatcher.set_engine(engine);
    }
}

/// State as used by the real server.
pub type SharedState = Arc<ServerState<Client>>;
