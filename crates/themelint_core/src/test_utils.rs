use std::path::Path;
use std::sync::Arc;

use crate::registry::ActiveCheck;
use crate::{Check, CheckRunner, Diagnostic, DocsetSnapshot, ObjectEntry, RunReport, SourceFile};

/// Docset with a handful of objects and filters.
pub fn docset() -> DocsetSnapshot {
    DocsetSnapshot::from_json(
        r#"{
            "objects": [
                { "name": "product", "access": { "global": false, "template": ["product"] } },
                { "name": "settings" },
                { "name": "section", "access": { "global": false, "template": [] } },
                { "name": "forloop", "access": { "global": false, "template": [] } },
                { "name": "tablerowloop", "access": { "global": false, "template": [] } }
            ],
            "filters": [
                { "name": "asset_url" },
                { "name": "append" },
                { "name": "upcase" }
            ]
        }"#,
    )
    .unwrap()
}

pub fn with_objects(names: &[&str]) -> DocsetSnapshot {
    DocsetSnapshot::new(
        names.iter().map(|name| ObjectEntry::new(*name)).collect(),
        Vec::new(),
        Vec::new(),
        Default::default(),
    )
}

pub fn source_file(root: &Path, relative_path: &str, source: &str) -> SourceFile {
    let path = root.join(relative_path);
    SourceFile::parse(format!("file://{}", path.display()), path, root, source, 1).unwrap()
}

/// Runs a single check with its default severity.
pub fn run(
    check: impl Check + 'static,
    relative_path: &str,
    source: &str,
    docset: Option<&DocsetSnapshot>,
) -> RunReport {
    let file = source_file(Path::new("/theme"), relative_path, source);
    CheckRunner::new(vec![ActiveCheck::new(Arc::new(check))]).run(&file, docset)
}

/// Messages and reported text of each diagnostic.
pub fn reported<'s>(source: &'s str, diagnostics: &[Diagnostic]) -> Vec<(String, &'s str)> {
    diagnostics
        .iter()
        .map(|d| (d.message.clone(), d.span.slice(source).unwrap_or_default()))
        .collect()
}
