//! Parsed documents handed to the runner.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use themelint_ast::LiquidNode;
use themelint_parser::{JsonParser, LiquidParser, Parser, SyntaxError};

use crate::LinterError;

/// Kind of theme file a check can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceCodeType {
    /// `.liquid` templates, sections and snippets.
    LiquidHtml,
    /// `.json` templates, section groups and locales.
    Json,
}

impl SourceCodeType {
    /// Determines the source type from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        [SourceCodeType::LiquidHtml, SourceCodeType::Json]
            .into_iter()
            .find(|source_type| source_type.parser().can_parse(ext))
    }

    /// Returns the parser for this source type.
    pub fn parser(self) -> &'static dyn Parser {
        match self {
            SourceCodeType::LiquidHtml => &LiquidParser,
            SourceCodeType::Json => &JsonParser,
        }
    }
}

/// One version of a document with its parsed tree.
///
/// Instances are immutable; an edit produces a new `SourceFile` so that the
/// text and tree always belong to the same version.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Document identifier (an editor uri or `file://` path).
    pub uri: String,
    /// Editor version; increases with every change.
    pub version: i32,
    /// Full text of this version.
    pub text: String,
    /// Tree parsed from `text`.
    pub tree: Arc<LiquidNode>,
    /// Absolute path of the document.
    pub path: PathBuf,
    /// Theme root the document belongs to.
    pub root: PathBuf,
    pub source_type: SourceCodeType,
    /// Problems the parser recovered from.
    pub syntax_errors: Vec<SyntaxError>,
}

impl SourceFile {
    /// Parses `text` with the parser matching the path's extension.
    pub fn parse(
        uri: impl Into<String>,
        path: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
        text: impl Into<String>,
        version: i32,
    ) -> Result<Self, LinterError> {
        let path = path.into();
        let text = text.into();
        let source_type = SourceCodeType::from_path(&path).ok_or_else(|| {
            LinterError::file(format!("Unsupported file type: {}", path.display()))
        })?;

        let parsed = source_type.parser().parse(&text)?;

        Ok(Self {
            uri: uri.into(),
            version,
            text,
            tree: Arc::new(parsed.tree),
            path,
            root: root.into(),
            source_type,
            syntax_errors: parsed.errors,
        })
    }

    /// True when the tree was built around syntax errors.
    pub fn is_tolerant(&self) -> bool {
        !self.syntax_errors.is_empty()
    }

    /// Path relative to the theme root, `/`-separated.
    ///
    /// Documents outside the root keep their full path.
    pub fn relative_path(&self) -> String {
        let relative = self.path.strip_prefix(&self.root).unwrap_or(&self.path);
        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("sections/header.liquid", Some(SourceCodeType::LiquidHtml))]
    #[case("templates/index.json", Some(SourceCodeType::Json))]
    #[case("assets/theme.css", None)]
    #[case("README", None)]
    fn test_source_type_from_path(#[case] path: &str, #[case] expected: Option<SourceCodeType>) {
        assert_eq!(SourceCodeType::from_path(Path::new(path)), expected);
    }

    #[test]
    fn test_parse_liquid() {
        let file = SourceFile::parse(
            "file:///theme/snippets/card.liquid",
            "/theme/snippets/card.liquid",
            "/theme",
            "{{ product.title }}",
            1,
        )
        .unwrap();

        assert_eq!(file.source_type, SourceCodeType::LiquidHtml);
        assert_eq!(file.relative_path(), "snippets/card.liquid");
        assert!(!file.is_tolerant());
        assert_eq!(file.tree.children.len(), 1);
    }

    #[test]
    fn test_parse_json_has_empty_tree() {
        let file = SourceFile::parse(
            "file:///theme/templates/index.json",
            "/theme/templates/index.json",
            "/theme",
            "{}",
            3,
        )
        .unwrap();

        assert_eq!(file.source_type, SourceCodeType::Json);
        assert!(!file.tree.has_children());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = SourceFile::parse("file:///a.css", "/a.css", "/", "", 1);
        assert!(matches!(result, Err(LinterError::File(_))));
    }

    #[test]
    fn test_relative_path_outside_root() {
        let file = SourceFile::parse("u", "/other/a.liquid", "/theme", "", 1).unwrap();
        assert_eq!(file.relative_path(), "other/a.liquid");
    }
}
