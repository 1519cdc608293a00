//! Reports filters the docset does not know.

use themelint_ast::{LiquidNode, NodeType};

use crate::check::HandlerResult;
use crate::{
    Check, CheckContext, CheckMeta, CheckVisitor, Severity, SourceCodeType, VisitorTable,
};

static META: CheckMeta = CheckMeta {
    code: "UnknownFilter",
    name: "Unknown Filter",
    description: "Reports filters that are not defined.",
    severity: Severity::Error,
    targets: &[SourceCodeType::LiquidHtml],
    schema: &[],
    recommended: true,
};

#[derive(Debug, Default)]
pub struct UnknownFilter;

impl Check for UnknownFilter {
    fn meta(&self) -> &CheckMeta {
        &META
    }

    fn create(&self, ctx: &CheckContext<'_>) -> Box<dyn CheckVisitor> {
        if ctx.docset().is_none() {
            return VisitorTable::not_applicable();
        }
        Box::new(VisitorTable::new(()).on_enter(NodeType::LiquidFilter, check_filter))
    }
}

fn check_filter(
    _state: &mut (),
    node: &LiquidNode,
    _ancestors: &[&LiquidNode],
    ctx: &mut CheckContext<'_>,
) -> HandlerResult {
    let (Some(name), Some(docset)) = (node.name(), ctx.docset()) else {
        return Ok(Vec::new());
    };
    if docset.filter(name).is_none() {
        ctx.report(format!("Unknown filter '{}' used.", name), node.span);
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_utils::{docset, reported, run};

    #[test]
    fn test_known_filters() {
        let source = "{{ 'a' | append: 'b' | upcase }}";
        let report = run(UnknownFilter, "sections/a.liquid", source, Some(&docset()));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_filter() {
        let source = "{{ 'a' | upcase | shout: 3 }}";
        let report = run(UnknownFilter, "sections/a.liquid", source, Some(&docset()));
        assert_eq!(
            reported(source, &report.diagnostics),
            vec![("Unknown filter 'shout' used.".to_string(), "shout: 3")]
        );
        assert_eq!(report.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_skipped_without_docset() {
        let report = run(UnknownFilter, "sections/a.liquid", "{{ a | shout }}", None);
        assert!(report.diagnostics.is_empty());
    }
}
