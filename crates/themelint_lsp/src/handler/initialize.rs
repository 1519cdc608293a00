//! Initialize and shutdown handlers.

use tower_lsp::Client;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::{error, info};

use themelint_core::CONFIG_FILE_NAME;

use crate::config::reload_config;
use crate::diagnostics::DiagnosticsPublisher;
use crate::state::ServerState;

/// Files whose creation, rename or deletion can change diagnostics.
const THEME_FILES_GLOB: &str = "**/*.{liquid,json}";

/// Handles the `initialize` LSP request.
pub fn handle_initialize<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: InitializeParams,
) -> Result<InitializeResult> {
    info!("themelint LSP server initializing...");

    #[allow(deprecated)]
    let root = params
        .workspace_folders
        .and_then(|folders| folders.into_iter().next())
        .map(|folder| folder.uri)
        .or(params.root_uri)
        .and_then(|uri| uri.to_file_path().ok());

    if let Some(root) = root {
        info!("Workspace root: {}", root.display());
        state.documents.set_workspace_root(Some(root));
        reload_config(state);
    }

    let theme_files = FileOperationRegistrationOptions {
        filters: vec![FileOperationFilter {
            scheme: Some("file".to_string()),
            pattern: FileOperationPattern {
                glob: THEME_FILES_GLOB.to_string(),
                matches: None,
                options: None,
            },
        }],
    };

    Ok(InitializeResult {
        capabilities: ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    ..Default::default()
                },
            )),
            document_link_provider: Some(DocumentLinkOptions {
                resolve_provider: Some(false),
                work_done_progress_options: Default::default(),
            }),
            workspace: Some(WorkspaceServerCapabilities {
                workspace_folders: None,
                file_operations: Some(WorkspaceFileOperationsServerCapabilities {
                    did_create: Some(theme_files.clone()),
                    did_rename: Some(theme_files.clone()),
                    did_delete: Some(theme_files),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        },
        server_info: Some(ServerInfo {
            name: "themelint-lsp".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    })
}

/// Handles the `initialized` LSP notification.
///
/// Asks the client to report changes to config files.
pub async fn handle_initialized(client: &Client) {
    let options = DidChangeWatchedFilesRegistrationOptions {
        watchers: vec![FileSystemWatcher {
            glob_pattern: GlobPattern::String(format!("**/{CONFIG_FILE_NAME}")),
            kind: None,
        }],
    };
    match serde_json::to_value(options) {
        Ok(register_options) => {
            let registration = Registration {
                id: "themelint-config-watcher".to_string(),
                method: "workspace/didChangeWatchedFiles".to_string(),
                register_options: Some(register_options),
            };
            if let Err(e) = client.register_capability(vec![registration]).await {
                error!("Failed to register config watcher: {}", e);
            }
        }
        Err(e) => error!("Failed to encode watcher options: {}", e),
    }

    client
        .log_message(MessageType::INFO, "themelint LSP server initialized!")
        .await;
}

/// Handles the `shutdown` LSP request.
pub fn handle_shutdown() -> Result<()> {
    info!("themelint LSP server shutting down...");
    Ok(())
}
