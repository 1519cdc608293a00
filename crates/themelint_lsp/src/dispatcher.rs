//! Turns a set of trigger uris into published diagnostics.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tower_lsp::lsp_types::Url;
use tracing::{debug, error, warn};

use themelint_core::{DocsetSnapshot, SourceFile};

use crate::diagnostics::{DiagnosticsManager, DiagnosticsPublisher};
use crate::documents::DocumentManager;
use crate::scheduler::RunChecks;
use crate::state::Engine;

/// Runs the checks for the scheduler.
pub struct CheckDispatcher<P> {
    documents: Arc<DocumentManager>,
    diagnostics: Arc<DiagnosticsManager<P>>,
    engine: RwLock<Arc<Engine>>,
}

impl<P: DiagnosticsPublisher> CheckDispatcher<P> {
    pub fn new(
        documents: Arc<DocumentManager>,
        diagnostics: Arc<DiagnosticsManager<P>>,
        engine: Engine,
    ) -> Self {
        Self {
            documents,
            diagnostics,
            engine: RwLock::new(Arc::new(engine)),
        }
    }

    /// The engine later runs will use.
    pub fn engine(&self) -> Arc<Engine> {
        Arc::clone(&self.engine.read())
    }

    pub fn set_engine(&self, engine: Engine) {
        *self.engine.write() = Arc::new(engine);
    }

    /// Open documents sharing a theme root with any of `uris`.
    ///
    /// Trigger uris need not be open; a deleted snippet still re-checks the
    /// documents that render it.
    fn affected(&self, uris: &BTreeSet<Url>) -> Vec<(Url, Arc<SourceFile>)> {
        let roots: HashSet<_> = uris.iter().map(|uri| self.documents.root_of(uri)).collect();
        let mut affected: Vec<_> = roots
            .iter()
            .flat_map(|root| self.documents.documents_in_root(root))
            .collect();
        affected.sort_by(|(a, _), (b, _)| a.cmp(b));
        affected
    }

    /// Reads everything the docset knows, giving up after the engine's timeout.
    async fn docset_snapshot(engine: &Engine) -> Option<Arc<DocsetSnapshot>> {
        let docset = engine.docset.as_ref()?;
        match tokio::time::timeout(
            engine.docset_timeout,
            DocsetSnapshot::capture(docset.as_ref()),
        )
        .await
        {
            Ok(snapshot) => Some(Arc::new(snapshot)),
            Err(_) => {
                warn!(
                    "Docset did not respond within {:?}; running without it",
                    engine.docset_timeout
                );
                None
            }
        }
    }
}

#[async_trait]
impl<P: DiagnosticsPublisher> RunChecks for CheckDispatcher<P> {
    async fn run_checks(&self, uris: BTreeSet<Url>) {
        let affected = self.affected(&uris);
        if affected.is_empty() {
            debug!("No open documents affected by {} uris", uris.len());
            return;
        }

        let engine = self.engine();
        let docset = Self::docset_snapshot(&engine).await;
        let runner = Arc::clone(&engine.runner);
        debug!("Checking {} documents", affected.len());

        let results = tokio::task::spawn_blocking(move || {
            affected
                .into_iter()
                .map(|(uri, file)| {
                    let report = runner.run(&file, docset.as_deref());
                    (uri, file, report)
                })
                .collect::<Vec<_>>()
        })
        .await;

        let results = match results {
            Ok(results) => results,
            Err(e) => {
                error!("Check run failed: {}", e);
                return;
            }
        };

        for (uri, file, report) in results {
            // Versions restart after a close, so compare snapshots instead.
            let is_current = || {
                self.documents
                    .get(&uri)
                    .is_some_and(|current| Arc::ptr_eq(&current, &file))
            };
            let published = self
                .diagnostics
                .publish_if(
                    &uri,
                    Some(file.version),
                    &file.text,
                    report.diagnostics,
                    is_current,
                )
                .await;
            if !published {
                debug!("Dropping stale results for {} at version {}", uri, file.version);
            }
        }
    }
}
