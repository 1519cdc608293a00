//! Document lifecycle handlers (open, change, close).

use tower_lsp::lsp_types::*;
use tracing::{debug, warn};

use crate::diagnostics::DiagnosticsPublisher;
use crate::documents::ChangeOutcome;
use crate::state::ServerState;

/// Handles the `textDocument/didOpen` notification.
pub fn handle_did_open<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: DidOpenTextDocumentParams,
) {
    let TextDocumentItem {
        uri, text, version, ..
    } = params.text_document;
    debug!("Document opened: {}", uri);

    match state.documents.open(uri.clone(), text, version) {
        Ok(_) => state.scheduler.schedule([uri]),
        Err(e) => warn!("Not checking {}: {}", uri, e),
    }
}

/// Handles the `textDocument/didChange` notification.
///
/// Sync is full-document, so the last change carries the whole text.
pub fn handle_did_change<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: DidChangeTextDocumentParams,
) {
    let uri = params.text_document.uri;
    let version = params.text_document.version;
    let Some(change) = params.content_changes.into_iter().last() else {
        return;
    };
    debug!("Document changed: {} (version {})", uri, version);

    match state.documents.change(uri.clone(), change.text, version) {
        Ok(ChangeOutcome::Updated(_)) => state.scheduler.schedule([uri]),
        Ok(ChangeOutcome::Stale { stored }) => {
            debug!("Ignoring version {} of {}; have {}", version, uri, stored);
        }
        Err(e) => warn!("Not checking {}: {}", uri, e),
    }
}

/// Handles the `textDocument/didClose` notification.
pub async fn handle_did_close<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: DidCloseTextDocumentParams,
) {
    let uri = params.text_document.uri;
    debug!("Document closed: {}", uri);
    state.documents.close(&uri);
    state.diagnostics.clear(&uri).await;
}
