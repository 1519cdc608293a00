//! Theme docset: the catalog of built-in objects, filters and tags.
//!
//! A [`ThemeDocset`] may be backed by anything (bundled data, a remote
//! index), so it is asynchronous. Checks never await it: the caller captures
//! a [`DocsetSnapshot`] once per run and checks read the snapshot.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::DocsetError;

/// A global Liquid object such as `product` or `settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the object is available. `None` means everywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<ObjectAccess>,
}

/// Availability policy of an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAccess {
    /// Available in every template.
    #[serde(default)]
    pub global: bool,
    /// Templates the object is available in.
    #[serde(default)]
    pub template: Vec<String>,
}

impl ObjectEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            access: None,
        }
    }

    pub fn with_access(mut self, access: ObjectAccess) -> Self {
        self.access = Some(access);
        self
    }

    /// True when the object can be referenced without a binding.
    ///
    /// `section` is always in scope inside section files.
    pub fn is_global(&self) -> bool {
        if self.name == "section" {
            return true;
        }
        match &self.access {
            None => true,
            Some(access) => access.global || !access.template.is_empty(),
        }
    }
}

/// A Liquid filter such as `upcase` or `asset_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<FilterParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParameter {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

impl FilterEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }
}

/// A Liquid tag such as `render` or `paginate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub name: String,
}

/// Source of catalog knowledge.
#[async_trait]
pub trait ThemeDocset: Send + Sync {
    /// Global objects.
    async fn objects(&self) -> Vec<ObjectEntry>;

    /// Filters.
    async fn filters(&self) -> Vec<FilterEntry>;

    /// Tags.
    async fn tags(&self) -> Vec<TagEntry>;

    /// Translations shipped with the platform, keyed by dotted path.
    async fn system_translations(&self) -> BTreeMap<String, String>;
}

/// Point-in-time copy of a docset with name lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DocsetData", into = "DocsetData")]
pub struct DocsetSnapshot {
    objects: Vec<ObjectEntry>,
    filters: Vec<FilterEntry>,
    tags: Vec<TagEntry>,
    system_translations: BTreeMap<String, String>,
    filter_index: HashMap<String, usize>,
}

/// Serialized form of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DocsetData {
    #[serde(default)]
    objects: Vec<ObjectEntry>,
    #[serde(default)]
    filters: Vec<FilterEntry>,
    #[serde(default)]
    tags: Vec<TagEntry>,
    #[serde(default)]
    system_translations: BTreeMap<String, String>,
}

impl From<DocsetData> for DocsetSnapshot {
    fn from(data: DocsetData) -> Self {
        DocsetSnapshot::new(
            data.objects,
            data.filters,
            data.tags,
            data.system_translations,
        )
    }
}

impl From<DocsetSnapshot> for DocsetData {
    fn from(snapshot: DocsetSnapshot) -> Self {
        DocsetData {
            objects: snapshot.objects,
            filters: snapshot.filters,
            tags: snapshot.tags,
            system_translations: snapshot.system_translations,
        }
    }
}

impl DocsetSnapshot {
    pub fn new(
        objects: Vec<ObjectEntry>,
        filters: Vec<FilterEntry>,
        tags: Vec<TagEntry>,
        system_translations: BTreeMap<String, String>,
    ) -> Self {
        let filter_index = filters
            .iter()
            .enumerate()
            .map(|(i, filter)| (filter.name.clone(), i))
            .collect();
        Self {
            objects,
            filters,
            tags,
            system_translations,
            filter_index,
        }
    }

    /// Copies everything `docset` currently knows.
    pub async fn capture(docset: &dyn ThemeDocset) -> Self {
        Self::new(
            docset.objects().await,
            docset.filters().await,
            docset.tags().await,
            docset.system_translations().await,
        )
    }

    /// Parses a snapshot from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, DocsetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a snapshot from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocsetError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DocsetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn objects(&self) -> &[ObjectEntry] {
        &self.objects
    }

    pub fn filters(&self) -> &[FilterEntry] {
        &self.filters
    }

    pub fn tags(&self) -> &[TagEntry] {
        &self.tags
    }

    pub fn system_translations(&self) -> &BTreeMap<String, String> {
        &self.system_translations
    }

    /// Objects that are in scope without a binding.
    pub fn global_objects(&self) -> impl Iterator<Item = &ObjectEntry> {
        self.objects.iter().filter(|object| object.is_global())
    }

    pub fn filter(&self, name: &str) -> Option<&FilterEntry> {
        self.filter_index.get(name).map(|&i| &self.filters[i])
    }
}

#[async_trait]
impl ThemeDocset for DocsetSnapshot {
    async fn objects(&self) -> Vec<ObjectEntry> {
        self.objects.clone()
    }

    async fn filters(&self) -> Vec<FilterEntry> {
        self.filters.clone()
    }

    async fn tags(&self) -> Vec<TagEntry> {
        self.tags.clone()
    }

    async fn system_translations(&self) -> BTreeMap<String, String> {
        self.system_translations.clone()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const DOCSET: &str = r#"{
        "objects": [
            { "name": "product", "access": { "global": false, "template": ["product"] } },
            { "name": "settings" },
            { "name": "section", "access": { "global": false, "template": [] } },
            { "name": "forloop", "access": { "global": false, "template": [] } },
            { "name": "shop", "access": { "global": true, "template": [] } }
        ],
        "filters": [
            { "name": "asset_url" },
            { "name": "append", "parameters": [{ "name": "string", "required": true }] }
        ],
        "tags": [{ "name": "render" }],
        "system_translations": { "shopify.checkout.title": "Checkout" }
    }"#;

    #[test]
    fn test_from_json() {
        let docset = DocsetSnapshot::from_json(DOCSET).unwrap();
        assert_eq!(docset.objects().len(), 5);
        assert_eq!(docset.tags()[0].name, "render");
        assert_eq!(
            docset.filter("append").map(|f| f.parameters.len()),
            Some(1)
        );
        assert!(docset.filter("missing").is_none());
    }

    #[rstest]
    #[case("product", true)]
    #[case("settings", true)]
    #[case("section", true)]
    #[case("shop", true)]
    #[case("forloop", false)]
    fn test_global_objects(#[case] name: &str, #[case] expected: bool) {
        let docset = DocsetSnapshot::from_json(DOCSET).unwrap();
        let is_global = docset.global_objects().any(|o| o.name == name);
        assert_eq!(is_global, expected);
    }

    #[test]
    fn test_invalid_json() {
        let result = DocsetSnapshot::from_json(r#"{ "objects": 3 }"#);
        assert!(matches!(result, Err(DocsetError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = DocsetSnapshot::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(DocsetError::Read { .. })));
    }

    #[tokio::test]
    async fn test_capture_round_trips_through_trait() {
        let docset = DocsetSnapshot::from_json(DOCSET).unwrap();
        let captured = DocsetSnapshot::capture(&docset).await;
        assert_eq!(captured, docset);
        assert_eq!(
            captured.system_translations().get("shopify.checkout.title"),
            Some(&"Checkout".to_string())
        );
    }
}
