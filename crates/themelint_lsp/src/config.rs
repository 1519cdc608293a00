//! Configuration management for the LSP server.

use std::path::Path;

use tracing::{error, info};

use themelint_core::{CheckRegistry, LinterConfig};

use crate::diagnostics::DiagnosticsPublisher;
use crate::state::{Engine, ServerState};

/// Builds the engine from the config file nearest to `root`.
pub fn load_engine(root: Option<&Path>) -> Engine {
    let config = match root.and_then(LinterConfig::discover) {
        Some(config_path) => {
            info!("Found config file: {}", config_path.display());
            match LinterConfig::from_file(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    error!("Failed to load config: {}", e);
                    LinterConfig::new()
                }
            }
        }
        None => LinterConfig::new(),
    };
    Engine::from_config(&CheckRegistry::builtin(), &config)
}

/// Reloads configuration from the workspace root.
pub fn reload_config<P: DiagnosticsPublisher>(state: &ServerState<P>) {
    let root = state.documents.workspace_root();
    let engine = load_engine(root.as_deref());
    info!("Checks reloaded: {:?}", engine);
    state.set_engine(engine);
}
