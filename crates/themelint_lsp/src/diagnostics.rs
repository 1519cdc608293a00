//! Publishing diagnostics to the client.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tower_lsp::Client;
use tower_lsp::lsp_types::{Diagnostic as LspDiagnostic, Url};
use tracing::debug;

use themelint_core::Diagnostic;

use crate::conversion::to_lsp_diagnostic;

/// Transport for `textDocument/publishDiagnostics`.
#[async_trait]
pub trait DiagnosticsPublisher: Send + Sync + 'static {
    async fn publish(&self, uri: Url, diagnostics: Vec<LspDiagnostic>, version: Option<i32>);
}

#[async_trait]
impl DiagnosticsPublisher for Client {
    async fn publish(&self, uri: Url, diagnostics: Vec<LspDiagnostic>, version: Option<i32>) {
        self.publish_diagnostics(uri, diagnostics, version).await;
    }
}

/// Diagnostics last sent for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedSet {
    pub version: Option<i32>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Sends full diagnostic sets and remembers what was last sent per uri.
///
/// Publishes and clears are sent one at a time, in the order they acquire
/// the send lock.
pub struct DiagnosticsManager<P> {
    publisher: P,
    published: Mutex<HashMap<Url, PublishedSet>>,
    sending: tokio::sync::Mutex<()>,
}

impl<P: DiagnosticsPublisher> DiagnosticsManager<P> {
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            published: Mutex::new(HashMap::new()),
            sending: tokio::sync::Mutex::new(()),
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Replaces the diagnostics of `uri` with `diagnostics`.
    ///
    /// `text` is the document version the diagnostics were computed on; it
    /// is needed to turn byte spans into line/column ranges.
    pub async fn publish(
        &self,
        uri: &Url,
        version: Option<i32>,
        text: &str,
        diagnostics: Vec<Diagnostic>,
    ) {
        self.publish_if(uri, version, text, diagnostics, || true)
            .await;
    }

    /// Like [`publish`](Self::publish), but only if `is_current` still holds
    /// once no other publish or clear is in flight. Returns whether the set
    /// was sent.
    pub async fn publish_if(
        &self,
        uri: &Url,
        version: Option<i32>,
        text: &str,
        diagnostics: Vec<Diagnostic>,
        is_current: impl FnOnce() -> bool,
    ) -> bool {
        let _sending = self.sending.lock().await;
        if !is_current() {
            return false;
        }

        let lsp_diagnostics: Vec<LspDiagnostic> = diagnostics
            .iter()
            .filter_map(|diag| to_lsp_diagnostic(diag, text))
            .collect();
        debug!(
            "Publishing {} diagnostics for {}",
            lsp_diagnostics.len(),
            uri
        );

        self.published.lock().insert(
            uri.clone(),
            PublishedSet {
                version,
                diagnostics,
            },
        );
        self.publisher
            .publish(uri.clone(), lsp_diagnostics, version)
            .await;
        true
    }

    /// Publishes an empty set for `uri` and forgets it.
    pub async fn clear(&self, uri: &Url) {
        let _sending = self.sending.lock().await;
        self.published.lock().remove(uri);
        self.publisher.publish(uri.clone(), Vec::new(), None).await;
    }

    pub fn last_published(&self, uri: &Url) -> Option<PublishedSet> {
        self.published.lock().get(uri).cloned()
    }
}
