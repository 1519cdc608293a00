//! themelint LSP server.
//!
//! Keeps open theme documents parsed, re-runs checks as they are edited and
//! publishes the resulting diagnostics.
//!
//! Edits are debounced through [`scheduler::RunScheduler`]; file creation,
//! renames and deletions force an immediate run over the affected theme.

pub mod config;
pub mod conversion;
pub mod diagnostics;
pub mod dispatcher;
pub mod documents;
pub mod handler;
pub mod scheduler;
pub mod state;

use std::sync::Arc;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use crate::config::load_engine;
use crate::state::{ServerState, SharedState};

pub use crate::diagnostics::{DiagnosticsManager, DiagnosticsPublisher, PublishedSet};
pub use crate::dispatcher::CheckDispatcher;
pub use crate::documents::{ChangeOutcome, DocumentManager};
pub use crate::scheduler::{RunChecks, RunScheduler};
pub use crate::state::Engine;

/// The LSP backend for themelint.
#[derive(Clone)]
pub struct Backend {
    /// LSP client for sending notifications.
    client: Client,
    state: SharedState,
}

impl Backend {
    /// Creates a new backend with default checks.
    ///
    /// The workspace config is loaded during `initialize`.
    pub fn new(client: Client) -> Self {
        let state = Arc::new(ServerState::new(client.clone(), load_engine(None)));
        Self { client, state }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handler::handle_initialize(&self.state, params)
    }

    async fn initialized(&self, _: InitializedParams) {
        handler::handle_initialized(&self.client).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handler::handle_shutdown()
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        handler::handle_did_open(&self.state, params);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        handler::handle_did_change(&self.state, params);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handler::handle_did_close(&self.state, params).await;
    }

    async fn did_create_files(&self, params: CreateFilesParams) {
        handler::handle_did_create_files(&self.state, params).await;
    }

    async fn did_rename_files(&self, params: RenameFilesParams) {
        handler::handle_did_rename_files(&self.state, params).await;
    }

    async fn did_delete_files(&self, params: DeleteFilesParams) {
        handler::handle_did_delete_files(&self.state, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handler::handle_did_change_watched_files(&self.state, params).await;
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        Ok(handler::handle_document_link(&self.state, params))
    }
}

/// Runs the LSP server over stdin/stdout.
pub async fn run() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
