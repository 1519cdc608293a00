//! Open documents and their parsed trees.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use themelint_core::{CONFIG_FILE_NAME, LinterError, SourceFile};

/// Result of [`DocumentManager::change`].
#[derive(Debug, Clone)]
pub enum ChangeOutcome {
    /// The new version replaced the stored one.
    Updated(Arc<SourceFile>),
    /// The change was not newer than the stored version and was ignored.
    Stale { stored: i32 },
}

/// Holds the latest parsed version of every open document.
///
/// Each open or change parses the full text and swaps in a complete
/// [`SourceFile`], so readers never see text and tree from different
/// versions.
#[derive(Default)]
pub struct DocumentManager {
    documents: RwLock<HashMap<Url, Arc<SourceFile>>>,
    workspace_root: RwLock<Option<PathBuf>>,
}

impl fmt::Debug for DocumentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentManager")
            .field("documents", &self.documents.read().len())
            .field("workspace_root", &*self.workspace_root.read())
            .finish()
    }
}

impl DocumentManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_workspace_root(&self, root: Option<PathBuf>) {
        *self.workspace_root.write() = root;
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.read().clone()
    }

    /// Parses and stores a newly opened document, replacing any previous entry.
    pub fn open(&self, uri: Url, text: String, version: i32) -> Result<Arc<SourceFile>, LinterError> {
        let file = Arc::new(self.parse(&uri, text, version)?);
        debug!("Opened {} at version {}", uri, version);
        self.documents.write().insert(uri, Arc::clone(&file));
        Ok(file)
    }

    /// Replaces a document's text if `version` is newer than the stored one.
    ///
    /// A change for a document that is not open behaves like `open`.
    pub fn change(&self, uri: Url, text: String, version: i32) -> Result<ChangeOutcome, LinterError> {
        if let Some(stored) = self.version(&uri).filter(|stored| version <= *stored) {
            return Ok(ChangeOutcome::Stale { stored });
        }

        let file = Arc::new(self.parse(&uri, text, version)?);

        // Another change may have landed while parsing.
        let mut documents = self.documents.write();
        if let Some(current) = documents.get(&uri).filter(|current| version <= current.version) {
            return Ok(ChangeOutcome::Stale {
                stored: current.version,
            });
        }
        documents.insert(uri, Arc::clone(&file));
        Ok(ChangeOutcome::Updated(file))
    }

    /// Forgets a document. Returns the last stored version of it.
    pub fn close(&self, uri: &Url) -> Option<Arc<SourceFile>> {
        self.documents.write().remove(uri)
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<SourceFile>> {
        self.documents.read().get(uri).cloned()
    }

    pub fn version(&self, uri: &Url) -> Option<i32> {
        self.documents.read().get(uri).map(|file| file.version)
    }

    /// Uris of every open document, in order.
    pub fn uris(&self) -> Vec<Url> {
        let mut uris: Vec<_> = self.documents.read().keys().cloned().collect();
        uris.sort();
        uris
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Every open document belonging to the theme at `root`, ordered by uri.
    pub fn documents_in_root(&self, root: &Path) -> Vec<(Url, Arc<SourceFile>)> {
        let mut documents: Vec<_> = self
            .documents
            .read()
            .iter()
            .filter(|(_, file)| file.root == root)
            .map(|(uri, file)| (uri.clone(), Arc::clone(file)))
            .collect();
        documents.sort_by(|(a, _), (b, _)| a.cmp(b));
        documents
    }

    /// Theme root of `uri`, whether or not the document is open.
    pub fn root_of(&self, uri: &Url) -> PathBuf {
        match self.get(uri) {
            Some(file) => file.root.clone(),
            None => self.root_for(&uri_to_path(uri)),
        }
    }

    /// Resolves the theme root a path belongs to.
    ///
    /// The workspace root wins when it contains `path`; otherwise the nearest
    /// ancestor holding a config file, otherwise the parent directory.
    pub fn root_for(&self, path: &Path) -> PathBuf {
        if let Some(root) = self
            .workspace_root
            .read()
            .as_ref()
            .filter(|root| path.starts_with(root))
        {
            return root.clone();
        }

        let parent = path.parent().unwrap_or(path);
        parent
            .ancestors()
            .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
            .unwrap_or(parent)
            .to_path_buf()
    }

    fn parse(&self, uri: &Url, text: String, version: i32) -> Result<SourceFile, LinterError> {
        let path = uri_to_path(uri);
        let root = self.root_for(&path);
        SourceFile::parse(uri.as_str(), path, root, text, version)
    }
}

/// Filesystem path of `uri`. Non-file uris map to their path component.
pub fn uri_to_path(uri: &Url) -> PathBuf {
    uri.to_file_path()
        .unwrap_or_else(|()| PathBuf::from(uri.path()))
}
