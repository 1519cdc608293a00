//! File operation and watched file handlers.
//!
//! A created, renamed or deleted file may be referenced by open documents
//! even when it is not open itself, so these force a run over its theme
//! instead of waiting for the debounce timer.

use tower_lsp::lsp_types::*;
use tracing::{debug, info, warn};

use themelint_core::CONFIG_FILE_NAME;

use crate::config::reload_config;
use crate::diagnostics::DiagnosticsPublisher;
use crate::state::ServerState;

/// Handles the `workspace/didCreateFiles` notification.
pub async fn handle_did_create_files<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: CreateFilesParams,
) {
    let uris = parse_uris(params.files.iter().map(|file| file.uri.as_str()));
    state.scheduler.force_run(uris).await;
}

/// Handles the `workspace/didRenameFiles` notification.
pub async fn handle_did_rename_files<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: RenameFilesParams,
) {
    let uris = parse_uris(params.files.iter().map(|file| file.new_uri.as_str()));
    state.scheduler.force_run(uris).await;
}

/// Handles the `workspace/didDeleteFiles` notification.
pub async fn handle_did_delete_files<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: DeleteFilesParams,
) {
    let uris = parse_uris(params.files.iter().map(|file| file.uri.as_str()));
    state.scheduler.force_run(uris).await;
}

/// Handles the `workspace/didChangeWatchedFiles` notification.
///
/// A changed config file rebuilds the checks and re-checks every open
/// document.
pub async fn handle_did_change_watched_files<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: DidChangeWatchedFilesParams,
) {
    debug!("Watched files changed: {:?}", params.changes);

    let config_changed = params
        .changes
        .iter()
        .any(|change| change.uri.path().ends_with(CONFIG_FILE_NAME));

    if config_changed {
        info!("Configuration file changed, reloading...");
        reload_config(state);
        state.scheduler.force_run(state.documents.uris()).await;
    }
}

fn parse_uris<'a>(uris: impl Iterator<Item = &'a str>) -> Vec<Url> {
    uris.filter_map(|uri| match Url::parse(uri) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!("Ignoring invalid uri {}: {}", uri, e);
            None
        }
    })
    .collect()
}
