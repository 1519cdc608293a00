//! LSP type conversion utilities.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};

use themelint_core::{Diagnostic as ThemeDiagnostic, Severity};

/// Value of the `source` field on every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "themelint";

/// Converts a check diagnostic to an LSP diagnostic.
///
/// Returns `None` when the span does not fit in `text`.
pub fn to_lsp_diagnostic(diag: &ThemeDiagnostic, text: &str) -> Option<Diagnostic> {
    let range = offset_to_range(diag.span.start as usize, diag.span.end as usize, text)?;

    Some(Diagnostic {
        range,
        severity: Some(to_lsp_severity(diag.severity)),
        code: Some(NumberOrString::String(diag.code.clone())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: diag.message.clone(),
        ..Default::default()
    })
}

pub fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    }
}

/// Converts byte offsets to an LSP range.
pub fn offset_to_range(start: usize, end: usize, text: &str) -> Option<Range> {
    let start_pos = offset_to_position(start, text)?;
    let end_pos = offset_to_position(end, text)?;
    Some(Range::new(start_pos, end_pos))
}

/// Converts a byte offset to an LSP position with UTF-16 columns.
pub fn offset_to_position(offset: usize, text: &str) -> Option<Position> {
    if offset > text.len() {
        return None;
    }

    let mut line = 0u32;
    let mut col = 0u32;

    for (index, ch) in text.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += ch.len_utf16() as u32;
        }
    }

    Some(Position::new(line, col))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use themelint_ast::Span;

    use super::*;

    #[test]
    fn test_offset_to_position_ascii() {
        let text = "{{ x }}";
        assert_eq!(offset_to_position(0, text), Some(Position::new(0, 0)));
        assert_eq!(offset_to_position(3, text), Some(Position::new(0, 3)));
        assert_eq!(offset_to_position(7, text), Some(Position::new(0, 7)));
        assert_eq!(offset_to_position(8, text), None);
    }

    #[test]
    fn test_offset_to_position_multiline() {
        let text = "{% if a %}\n  {{ b }}\n{% endif %}";
        assert_eq!(offset_to_position(11, text), Some(Position::new(1, 0)));
        assert_eq!(offset_to_position(16, text), Some(Position::new(1, 5)));
        assert_eq!(offset_to_position(text.len(), text), Some(Position::new(2, 11)));
    }

    #[test]
    fn test_offset_to_position_counts_utf16_units() {
        // "é" is 2 bytes / 1 unit, "🎉" is 4 bytes / 2 units.
        let text = "é🎉{{ x }}";
        assert_eq!(offset_to_position(2, text), Some(Position::new(0, 1)));
        assert_eq!(offset_to_position(6, text), Some(Position::new(0, 3)));
        assert_eq!(offset_to_position(9, text), Some(Position::new(0, 6)));
    }

    #[test]
    fn test_offset_to_position_empty_text() {
        assert_eq!(offset_to_position(0, ""), Some(Position::new(0, 0)));
        assert_eq!(offset_to_position(1, ""), None);
    }

    #[test]
    fn test_to_lsp_diagnostic() {
        let text = "{{ y }}";
        let diag = ThemeDiagnostic::new(
            "UndefinedObject",
            "Unknown object 'y' used.",
            Span::new(3, 4),
            "file:///theme/templates/index.liquid",
        )
        .with_severity(Severity::Warning);

        let lsp = to_lsp_diagnostic(&diag, text).unwrap();
        assert_eq!(lsp.range, Range::new(Position::new(0, 3), Position::new(0, 4)));
        assert_eq!(lsp.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(
            lsp.code,
            Some(NumberOrString::String("UndefinedObject".to_string()))
        );
        assert_eq!(lsp.source.as_deref(), Some("themelint"));
        assert_eq!(lsp.message, "Unknown object 'y' used.");
    }

    #[test]
    fn test_out_of_range_span_is_dropped() {
        let diag = ThemeDiagnostic::new("X", "m", Span::new(0, 40), "file:///a.liquid");
        assert_eq!(to_lsp_diagnostic(&diag, "short"), None);
    }
}
