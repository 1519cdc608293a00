#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tower_lsp::lsp_types::{Diagnostic, Url};

use themelint_core::{
    CONFIG_FILE_NAME, DocsetSnapshot, FilterEntry, ObjectEntry, TagEntry, ThemeDocset,
};
use themelint_lsp::DiagnosticsPublisher;
use themelint_lsp::config::load_engine;
use themelint_lsp::state::ServerState;

/// One `publishDiagnostics` notification.
#[derive(Debug, Clone)]
pub struct Published {
    pub uri: Url,
    pub diagnostics: Vec<Diagnostic>,
    pub version: Option<i32>,
}

/// Publisher that records instead of sending.
#[derive(Default)]
pub struct RecordingPublisher {
    calls: Mutex<Vec<Published>>,
}

#[async_trait]
impl DiagnosticsPublisher for RecordingPublisher {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.calls.lock().push(Published {
            uri,
            diagnostics,
            version,
        });
    }
}

impl RecordingPublisher {
    pub fn calls(&self) -> Vec<Published> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, uri: &Url) -> Vec<Published> {
        self.calls
            .lock()
            .iter()
            .filter(|call| &call.uri == uri)
            .cloned()
            .collect()
    }

    /// Messages of the last set published for `uri`.
    pub fn last_messages(&self, uri: &Url) -> Option<Vec<String>> {
        self.calls_for(uri)
            .last()
            .map(|call| call.diagnostics.iter().map(|d| d.message.clone()).collect())
    }
}

/// Docset that takes `delay` to list its objects, keeping runs in flight.
pub struct SlowDocset {
    pub snapshot: DocsetSnapshot,
    pub delay: Duration,
}

#[async_trait]
impl ThemeDocset for SlowDocset {
    async fn objects(&self) -> Vec<ObjectEntry> {
        tokio::time::sleep(self.delay).await;
        ThemeDocset::objects(&self.snapshot).await
    }

    async fn filters(&self) -> Vec<FilterEntry> {
        ThemeDocset::filters(&self.snapshot).await
    }

    async fn tags(&self) -> Vec<TagEntry> {
        ThemeDocset::tags(&self.snapshot).await
    }

    async fn system_translations(&self) -> BTreeMap<String, String> {
        ThemeDocset::system_translations(&self.snapshot).await
    }
}

/// A theme directory with a config and a small docset.
pub struct Theme {
    pub dir: TempDir,
}

impl Theme {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("docset.json"),
            r#"{
                "objects": [{ "name": "product" }, { "name": "settings" }],
                "filters": [{ "name": "upcase" }, { "name": "asset_url" }]
            }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "docset": "docset.json", "debounce_ms": 100 }"#,
        )
        .unwrap();
        for sub in ["templates", "sections", "snippets", "assets"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn uri(&self, relative: &str) -> Url {
        Url::from_file_path(self.path(relative)).unwrap()
    }

    pub fn write(&self, relative: &str, content: &str) {
        fs::write(self.path(relative), content).unwrap();
    }

    /// Server state rooted at this theme, publishing into a recorder.
    pub fn server(&self) -> ServerState<RecordingPublisher> {
        let state = ServerState::new(RecordingPublisher::default(), load_engine(Some(self.root())));
        state
            .documents
            .set_workspace_root(Some(self.root().to_path_buf()));
        state
    }

    /// Like [`server`](Self::server), but every run waits `delay` on the
    /// docset before checking.
    pub fn slow_server(&self, delay: Duration) -> ServerState<RecordingPublisher> {
        let snapshot = DocsetSnapshot::from_file(self.path("docset.json")).unwrap();
        let engine = load_engine(Some(self.root()))
            .with_docset(Arc::new(SlowDocset { snapshot, delay }));
        let state = ServerState::new(RecordingPublisher::default(), engine);
        state
            .documents
            .set_workspace_root(Some(self.root().to_path_buf()));
        state
    }
}
