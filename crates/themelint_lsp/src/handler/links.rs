//! Document links to the theme files a document references.

use tower_lsp::lsp_types::*;

use themelint_core::collect_dependencies;

use crate::conversion::offset_to_range;
use crate::diagnostics::DiagnosticsPublisher;
use crate::state::ServerState;

/// Handles the `textDocument/documentLink` request.
pub fn handle_document_link<P: DiagnosticsPublisher>(
    state: &ServerState<P>,
    params: DocumentLinkParams,
) -> Option<Vec<DocumentLink>> {
    let file = state.documents.get(&params.text_document.uri)?;

    let links = collect_dependencies(&file.tree)
        .into_iter()
        .filter_map(|dependency| {
            let span = dependency.span();
            let range = offset_to_range(span.start as usize, span.end as usize, &file.text)?;
            let target = Url::from_file_path(file.root.join(dependency.relative_path())).ok()?;
            Some(DocumentLink {
                range,
                target: Some(target),
                tooltip: None,
                data: None,
            })
        })
        .collect();

    Some(links)
}
