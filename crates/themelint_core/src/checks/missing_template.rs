//! Reports `render`, `include`, `section` and `asset_url` references to
//! files that do not exist in the theme.
//!
//! Every reference is also handed back to the runner as a derived node.

use themelint_ast::{LiquidNode, NodeType};
use tracing::trace;

use crate::check::{HandlerResult, SchemaProperty, SettingKind};
use crate::config::IgnoreMatcher;
use crate::dependencies::derive_dependency;
use crate::{
    Check, CheckContext, CheckError, CheckMeta, CheckVisitor, DerivedNode, Severity,
    SourceCodeType, VisitorTable,
};

static META: CheckMeta = CheckMeta {
    code: "MissingTemplate",
    name: "Missing Template",
    description: "Reports references to missing snippets, sections and assets.",
    severity: Severity::Error,
    targets: &[SourceCodeType::LiquidHtml],
    schema: &[SchemaProperty {
        key: "ignore_missing",
        kind: SettingKind::Array,
        description: "Glob patterns of theme-relative paths that may be missing.",
    }],
    recommended: true,
};

#[derive(Debug, Default)]
pub struct MissingTemplate;

#[derive(Debug, Default)]
struct State {
    references: Vec<DerivedNode>,
}

impl Check for MissingTemplate {
    fn meta(&self) -> &CheckMeta {
        &META
    }

    fn create(&self, _ctx: &CheckContext<'_>) -> Box<dyn CheckVisitor> {
        Box::new(
            VisitorTable::new(State::default())
                .on_enter(NodeType::LiquidTag, record_reference)
                .on_enter(NodeType::LiquidFilter, record_reference)
                .on_end(report_missing),
        )
    }
}

fn record_reference(
    state: &mut State,
    node: &LiquidNode,
    ancestors: &[&LiquidNode],
    _ctx: &mut CheckContext<'_>,
) -> HandlerResult {
    let Some(derived) = derive_dependency(node, ancestors) else {
        return Ok(Vec::new());
    };
    state.references.push(derived.clone());
    Ok(vec![derived])
}

fn ignore_missing(ctx: &CheckContext<'_>) -> Result<IgnoreMatcher, CheckError> {
    let Some(value) = ctx.setting("ignore_missing") else {
        return Ok(IgnoreMatcher::default());
    };
    let patterns = value
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| CheckError::invalid_setting("ignore_missing", "expected an array of globs"))?;

    IgnoreMatcher::new(&patterns)
        .map_err(|e| CheckError::invalid_setting("ignore_missing", e.to_string()))
}

fn report_missing(state: &mut State, ctx: &mut CheckContext<'_>) -> HandlerResult {
    let ignored = ignore_missing(ctx)?;

    for reference in &state.references {
        let relative = reference.relative_path();
        if ignored.is_ignored(&relative) {
            continue;
        }
        let path = ctx.resolve(&relative);
        trace!("Checking {} exists", path.display());
        if !path.exists() {
            ctx.report(format!("'{}' does not exist", relative), reference.span());
        }
    }
    Ok(Vec::new())
}
