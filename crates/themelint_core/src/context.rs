//! Per-check, per-document context handed to check handlers.

use std::path::PathBuf;

use serde_json::Value;
use themelint_ast::Span;
use tracing::debug;

use crate::{Diagnostic, DocsetSnapshot, Severity, SourceFile};

static NO_SETTINGS: Value = Value::Null;

/// What a check can see and do while visiting one document.
///
/// Diagnostics reported here are buffered per check; the runner only keeps
/// them if the check finishes the document without failing.
#[derive(Debug)]
pub struct CheckContext<'a> {
    file: &'a SourceFile,
    docset: Option<&'a DocsetSnapshot>,
    code: &'a str,
    severity: Severity,
    settings: &'a Value,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CheckContext<'a> {
    /// Creates a context for the check `code` reporting at `severity`.
    pub fn new(file: &'a SourceFile, code: &'a str, severity: Severity) -> Self {
        Self {
            file,
            docset: None,
            code,
            severity,
            settings: &NO_SETTINGS,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_docset(mut self, docset: Option<&'a DocsetSnapshot>) -> Self {
        self.docset = docset;
        self
    }

    pub fn with_settings(mut self, settings: &'a Value) -> Self {
        self.settings = settings;
        self
    }

    /// Records a diagnostic for the current document.
    ///
    /// Spans reaching past the end of the text are clamped to it.
    pub fn report(&mut self, message: impl Into<String>, span: Span) {
        let len = self.file.text.len() as u32;
        let span = if span.fits_within(self.file.text.len()) {
            span
        } else {
            debug!(code = self.code, ?span, "clamping diagnostic span to document");
            let end = span.end.min(len);
            Span::new(span.start.min(end), end)
        };

        self.diagnostics.push(
            Diagnostic::new(self.code, message, span, self.file.uri.as_str())
                .with_severity(self.severity),
        );
    }

    pub fn file(&self) -> &'a SourceFile {
        self.file
    }

    pub fn uri(&self) -> &'a str {
        &self.file.uri
    }

    /// Full text of the document version being checked.
    pub fn source(&self) -> &'a str {
        &self.file.text
    }

    /// Document path relative to the theme root.
    pub fn relative_path(&self) -> String {
        self.file.relative_path()
    }

    /// Catalog snapshot for this run, if one is available.
    pub fn docset(&self) -> Option<&'a DocsetSnapshot> {
        self.docset
    }

    /// Resolves a theme-relative path such as `snippets/card.liquid`.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.file.root.join(relative.trim_start_matches('/'))
    }

    /// Settings configured for this check.
    pub fn settings(&self) -> &'a Value {
        self.settings
    }

    pub fn setting(&self, key: &str) -> Option<&'a Value> {
        self.settings.get(key)
    }

    /// Effective severity of the check.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    #[cfg(test)]
    pub(crate) fn for_test(file: &'a SourceFile) -> Self {
        Self::new(file, "Test", Severity::Warning)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    fn file() -> SourceFile {
        SourceFile::parse(
            "file:///theme/sections/a.liquid",
            "/theme/sections/a.liquid",
            "/theme",
            "{{ y }}",
            7,
        )
        .unwrap()
    }

    #[test]
    fn test_report_uses_code_severity_and_uri() {
        let file = file();
        let mut ctx = CheckContext::new(&file, "UndefinedObject", Severity::Info);
        ctx.report("Unknown object 'y' used.", Span::new(3, 4));

        assert_eq!(
            ctx.diagnostics(),
            &[Diagnostic::new(
                "UndefinedObject",
                "Unknown object 'y' used.",
                Span::new(3, 4),
                "file:///theme/sections/a.liquid",
            )
            .with_severity(Severity::Info)]
        );
    }

    #[test]
    fn test_report_clamps_out_of_range_span() {
        let file = file();
        let mut ctx = CheckContext::for_test(&file);
        ctx.report("m", Span::new(5, 100));
        ctx.report("m", Span::new(50, 100));
        let spans: Vec<_> = ctx.diagnostics().iter().map(|d| d.span).collect();
        assert_eq!(spans, vec![Span::new(5, 7), Span::new(7, 7)]);
    }

    #[test]
    fn test_paths() {
        let file = file();
        let ctx = CheckContext::for_test(&file);
        assert_eq!(ctx.relative_path(), "sections/a.liquid");
        assert_eq!(
            ctx.resolve("snippets/card.liquid"),
            Path::new("/theme/snippets/card.liquid")
        );
        assert_eq!(ctx.source(), "{{ y }}");
    }

    #[test]
    fn test_settings_default_to_null() {
        let file = file();
        let ctx = CheckContext::for_test(&file);
        assert!(ctx.settings().is_null());
        assert!(ctx.setting("max").is_none());

        let settings = serde_json::json!({ "max": 3 });
        let ctx = CheckContext::for_test(&file).with_settings(&settings);
        assert_eq!(ctx.setting("max"), Some(&serde_json::json!(3)));
    }
}
