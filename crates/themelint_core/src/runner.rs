//! Check runner: one walk per document drives every applicable check.
//!
//! Each check is isolated. If a handler returns an error or panics, that
//! check's diagnostics and derived nodes for the document are discarded, a
//! [`CheckFailure`] is recorded, and the walk continues for the others.

use std::any::Any;
use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use serde::Serialize;
use themelint_ast::LiquidNode;
use themelint_ast::walk::{VisitResult, Visitor, walk};
use tracing::{debug, error};

use crate::check::HandlerResult;
use crate::config::IgnoreMatcher;
use crate::registry::ActiveCheck;
use crate::{
    CheckContext, CheckRegistry, CheckVisitor, DerivedNode, Diagnostic, DocsetSnapshot,
    LinterConfig, LinterError, SourceFile,
};

/// A check that failed on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    pub code: String,
    pub uri: String,
    pub message: String,
}

/// Outcome of running all checks on one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Diagnostics of checks that completed, sorted by span then code.
    pub diagnostics: Vec<Diagnostic>,
    /// Derived nodes of checks that completed, in visit order.
    pub derived: Vec<DerivedNode>,
    pub failures: Vec<CheckFailure>,
}

/// Runs a fixed set of checks over documents.
#[derive(Debug, Clone, Default)]
pub struct CheckRunner {
    checks: Vec<ActiveCheck>,
    ignore: IgnoreMatcher,
}

impl CheckRunner {
    pub fn new(checks: Vec<ActiveCheck>) -> Self {
        Self {
            checks,
            ignore: IgnoreMatcher::default(),
        }
    }

    /// Builds a runner from the registry filtered by `config`.
    pub fn from_config(registry: &CheckRegistry, config: &LinterConfig) -> Result<Self, LinterError> {
        Ok(Self {
            checks: registry.active_checks(config),
            ignore: config.ignore_matcher()?,
        })
    }

    pub fn checks(&self) -> &[ActiveCheck] {
        &self.checks
    }

    /// Returns true if `file` is excluded by the `ignore` patterns.
    pub fn is_ignored(&self, file: &SourceFile) -> bool {
        self.ignore.is_ignored(&file.relative_path())
    }

    /// Runs every applicable check over `file`.
    pub fn run(&self, file: &SourceFile, docset: Option<&DocsetSnapshot>) -> RunReport {
        if self.is_ignored(file) {
            debug!("Skipping ignored file {}", file.uri);
            return RunReport::default();
        }

        let start = Instant::now();
        let mut failures = Vec::new();
        let mut slots = Vec::new();

        for active in &self.checks {
            let meta = active.check.meta();
            if !meta.targets(file.source_type) {
                continue;
            }

            let ctx = CheckContext::new(file, meta.code, active.severity)
                .with_docset(docset)
                .with_settings(&active.settings);

            let created = panic::catch_unwind(AssertUnwindSafe(|| active.check.create(&ctx)));
            match created {
                Ok(visitor) if visitor.is_empty() => {
                    debug!("{} does not apply to {}", meta.code, file.uri);
                }
                Ok(visitor) => slots.push(Slot {
                    code: meta.code,
                    visitor,
                    ctx,
                    derived: Vec::new(),
                    failure: None,
                }),
                Err(payload) => failures.push(failure(meta.code, file, panic_message(payload))),
            }
        }

        let mut multiplexer = Multiplexer { slots };
        if let Err(never) = walk(&file.tree, &mut multiplexer) {
            match never {}
        }

        let mut diagnostics = Vec::new();
        let mut derived = Vec::new();
        for mut slot in multiplexer.slots {
            match slot.failure {
                Some(message) => failures.push(failure(slot.code, file, message)),
                None => {
                    diagnostics.extend(slot.ctx.take_diagnostics());
                    derived.append(&mut slot.derived);
                }
            }
        }

        diagnostics.sort_by(|a, b| {
            a.span
                .cmp(&b.span)
                .then_with(|| a.code.cmp(&b.code))
                .then_with(|| a.message.cmp(&b.message))
        });

        debug!(
            "Checked {} in {:?}: {} diagnostics, {} failures",
            file.uri,
            start.elapsed(),
            diagnostics.len(),
            failures.len()
        );

        RunReport {
            diagnostics,
            derived,
            failures,
        }
    }
}

fn failure(code: &str, file: &SourceFile, message: String) -> CheckFailure {
    error!("Check {} failed on {}: {}", code, file.uri, message);
    CheckFailure {
        code: code.to_string(),
        uri: file.uri.clone(),
        message,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// One check's visitor and buffers for the current document.
struct Slot<'a> {
    code: &'static str,
    visitor: Box<dyn CheckVisitor>,
    ctx: CheckContext<'a>,
    derived: Vec<DerivedNode>,
    failure: Option<String>,
}

impl Slot<'_> {
    fn call(
        &mut self,
        hook: impl FnOnce(&mut Box<dyn CheckVisitor>, &mut CheckContext<'_>) -> HandlerResult,
    ) {
        if self.failure.is_some() {
            return;
        }
        let visitor = &mut self.visitor;
        let ctx = &mut self.ctx;
        match panic::catch_unwind(AssertUnwindSafe(|| hook(visitor, ctx))) {
            Ok(Ok(derived)) => self.derived.extend(derived),
            Ok(Err(e)) => self.failure = Some(e.to_string()),
            Err(payload) => self.failure = Some(panic_message(payload)),
        }
    }
}

/// Fans every walker hook out to all live checks.
struct Multiplexer<'a> {
    slots: Vec<Slot<'a>>,
}

impl<'t> Visitor<'t> for Multiplexer<'_> {
    type Derived = Infallible;
    type Error = Infallible;

    fn enter(
        &mut self,
        node: &'t LiquidNode,
        ancestors: &[&'t LiquidNode],
    ) -> VisitResult<Infallible, Infallible> {
        for slot in &mut self.slots {
            slot.call(|visitor, ctx| visitor.enter(node, ancestors, ctx));
        }
        Ok(Vec::new())
    }

    fn exit(
        &mut self,
        node: &'t LiquidNode,
        ancestors: &[&'t LiquidNode],
    ) -> VisitResult<Infallible, Infallible> {
        for slot in &mut self.slots {
            slot.call(|visitor, ctx| visitor.exit(node, ancestors, ctx));
        }
        Ok(Vec::new())
    }

    fn on_traversal_end(&mut self) -> VisitResult<Infallible, Infallible> {
        for slot in &mut self.slots {
            slot.call(|visitor, ctx| visitor.on_traversal_end(ctx));
        }
        Ok(Vec::new())
    }
}
