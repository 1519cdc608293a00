//! Reports references to Liquid objects that are neither bound in the
//! document nor provided globally by the docset.
//!
//! Bindings are recorded as scopes while walking. References are buffered
//! and resolved once at the end, when both the document's bindings and the
//! docset's globals are known.

use std::collections::HashMap;

use themelint_ast::{LiquidNode, NodeType, Span, TagMarkup};

use crate::check::HandlerResult;
use crate::{
    Check, CheckContext, CheckMeta, CheckVisitor, Severity, SourceCodeType, VisitorTable,
};

static META: CheckMeta = CheckMeta {
    code: "UndefinedObject",
    name: "Undefined Object",
    description: "Reports references to undefined Liquid objects.",
    severity: Severity::Warning,
    targets: &[SourceCodeType::LiquidHtml],
    schema: &[],
    recommended: true,
};

/// Byte window in which a binding is visible. Missing bounds are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl Scope {
    /// Visible from `start` to the end of the document.
    pub fn from(start: u32) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.start.is_none_or(|start| start <= offset) && self.end.is_none_or(|end| offset < end)
    }
}

/// Bindings seen so far. A name with no scopes is visible everywhere; a
/// missing name was never bound.
#[derive(Debug, Default)]
pub struct ScopeTable {
    scopes: HashMap<String, Vec<Scope>>,
}

impl ScopeTable {
    pub fn bind(&mut self, name: &str, scope: Scope) {
        self.scopes.entry(name.to_string()).or_default().push(scope);
    }

    /// Makes `name` visible everywhere, replacing recorded scopes.
    pub fn bind_global(&mut self, name: &str) {
        self.scopes.insert(name.to_string(), Vec::new());
    }

    pub fn is_defined(&self, name: &str, offset: u32) -> bool {
        match self.scopes.get(name) {
            None => false,
            Some(scopes) if scopes.is_empty() => true,
            Some(scopes) => scopes.iter().any(|scope| scope.contains(offset)),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    table: ScopeTable,
    references: Vec<(String, Span)>,
}

/// See the module documentation.
#[derive(Debug, Default)]
pub struct UndefinedObject;

impl Check for UndefinedObject {
    fn meta(&self) -> &CheckMeta {
        &META
    }

    fn create(&self, ctx: &CheckContext<'_>) -> Box<dyn CheckVisitor> {
        // Snippets are rendered with variables from other files.
        if ctx.relative_path().starts_with("snippets/") || ctx.docset().is_none() {
            return VisitorTable::not_applicable();
        }

        Box::new(
            VisitorTable::new(State::default())
                .on_enter(NodeType::LiquidTag, record_binding)
                .on_enter(NodeType::VariableLookup, buffer_reference)
                .on_end(resolve_references),
        )
    }
}

fn record_binding(
    state: &mut State,
    node: &LiquidNode,
    _ancestors: &[&LiquidNode],
    _ctx: &mut CheckContext<'_>,
) -> HandlerResult {
    let Some(tag) = node.tag() else {
        return Ok(Vec::new());
    };
    let header_end = tag.block_start.end;

    match &tag.markup {
        TagMarkup::Assign { name } | TagMarkup::Capture { name } => {
            state.table.bind(name, Scope::from(header_end));
        }
        TagMarkup::For { variable_name } | TagMarkup::Tablerow { variable_name } => {
            let scope = Scope {
                start: Some(header_end),
                end: tag.block_end.map(|closing| closing.start),
            };
            let loop_object = if matches!(tag.markup, TagMarkup::For { .. }) {
                "forloop"
            } else {
                "tablerowloop"
            };
            state.table.bind(variable_name, scope);
            state.table.bind(loop_object, scope);
        }
        _ => {}
    }
    Ok(Vec::new())
}

fn buffer_reference(
    state: &mut State,
    node: &LiquidNode,
    ancestors: &[&LiquidNode],
    _ctx: &mut CheckContext<'_>,
) -> HandlerResult {
    // `{% capture x %}` names its target; it does not read it.
    if ancestors.last().is_some_and(|parent| parent.is_tag_named("capture")) {
        return Ok(Vec::new());
    }
    if let Some(name) = node.lookup_name() {
        state.references.push((name.to_string(), node.span));
    }
    Ok(Vec::new())
}

fn resolve_references(state: &mut State, ctx: &mut CheckContext<'_>) -> HandlerResult {
    let Some(docset) = ctx.docset() else {
        return Ok(Vec::new());
    };
    for object in docset.global_objects() {
        state.table.bind_global(&object.name);
    }

    for (name, span) in &state.references {
        if !state.table.is_defined(name, span.start) {
            ctx.report(format!("Unknown object '{}' used.", name), *span);
        }
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::test_utils::{docset, reported, run, with_objects};

    fn undefined(source: &str) -> Vec<(String, &str)> {
        let report = run(UndefinedObject, "sections/main.liquid", source, Some(&docset()));
        assert!(report.failures.is_empty());
        reported(source, &report.diagnostics)
    }

    #[test]
    fn test_assign_defines_following_reference() {
        assert_eq!(undefined("{% assign x = 1 %}{{ x }}"), Vec::new());
    }

    #[test]
    fn test_unknown_reference_is_reported_once() {
        assert_eq!(
            undefined("{{ y }}"),
            vec![("Unknown object 'y' used.".to_string(), "y")]
        );
    }

    #[test]
    fn test_loop_variable_is_scoped_to_body() {
        let source = "{% for i in (1..3) %}{{ i }}{% endfor %}{{ i }}";
        let report = run(UndefinedObject, "sections/main.liquid", source, Some(&docset()));
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].span, Span::new(43, 44));
    }

    #[test]
    fn test_capture_target_is_not_a_read() {
        assert_eq!(
            undefined("{% capture x %}{{ x }}{% endcapture %}"),
            Vec::new()
        );
    }

    #[test]
    fn test_reference_before_assign_is_undefined() {
        assert_eq!(
            undefined("{{ x }}{% assign x = 1 %}{{ x }}"),
            vec![("Unknown object 'x' used.".to_string(), "x")]
        );
    }

    #[rstest]
    #[case("{{ product.title }}")]
    #[case("{{ settings.logo }}")]
    #[case("{{ section.id }}")]
    #[case("{% for p in collection %}{{ forloop.index }}{% endfor %}")]
    #[case("{% tablerow p in product.images %}{{ tablerowloop.col }}{% endtablerow %}")]
    fn test_defined(#[case] source: &str) {
        let found = undefined(source);
        assert!(
            found.iter().all(|(_, name)| *name == "collection"),
            "{found:?}"
        );
    }

    #[rstest]
    #[case("{{ forloop.index }}", "forloop")]
    #[case("{% for a in b %}{% endfor %}{{ a }}", "a")]
    #[case("{% if x %}{% endif %}", "x")]
    #[case("{{ 'a' | append: missing }}", "missing")]
    fn test_undefined(#[case] source: &str, #[case] expected: &str) {
        let found = undefined(source);
        let names: Vec<_> = found.iter().map(|(_, name)| *name).collect();
        assert!(names.contains(&expected), "{names:?}");
    }

    #[test]
    fn test_unclosed_loop_scope_is_unbounded() {
        assert_eq!(undefined("{% for i in (1..3) %}{{ i }}"), Vec::new());
    }

    #[test]
    fn test_bracket_lookup_is_ignored() {
        assert_eq!(undefined("{{ ['product'] }}"), Vec::new());
    }

    #[test]
    fn test_snippets_are_skipped() {
        let report = run(UndefinedObject, "snippets/card.liquid", "{{ y }}", Some(&docset()));
        assert_eq!(report, crate::RunReport::default());
    }

    #[test]
    fn test_skipped_without_docset() {
        let report = run(UndefinedObject, "sections/main.liquid", "{{ y }}", None);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_global_object_shadows_nothing() {
        let docset = with_objects(&["y"]);
        let report = run(UndefinedObject, "templates/page.liquid", "{{ y }}", Some(&docset));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_severity_is_warning() {
        let report = run(UndefinedObject, "layout/theme.liquid", "{{ nope }}", Some(&docset()));
        assert_eq!(report.diagnostics[0].severity, Severity::Warning);
        assert_eq!(report.diagnostics[0].code, "UndefinedObject");
    }

    #[rstest]
    #[case(Scope { start: None, end: None }, 0, true)]
    #[case(Scope::from(5), 5, true)]
    #[case(Scope::from(5), 4, false)]
    #[case(Scope { start: Some(2), end: Some(4) }, 4, false)]
    #[case(Scope { start: None, end: Some(4) }, 3, true)]
    fn test_scope_contains(#[case] scope: Scope, #[case] offset: u32, #[case] expected: bool) {
        assert_eq!(scope.contains(offset), expected);
    }

    #[test]
    fn test_scope_table() {
        let mut table = ScopeTable::default();
        assert!(!table.is_defined("x", 0));
        table.bind("x", Scope::from(10));
        assert!(!table.is_defined("x", 5));
        assert!(table.is_defined("x", 10));
        table.bind_global("x");
        assert!(table.is_defined("x", 5));
    }
}
