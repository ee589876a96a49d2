// ── Resource catalog ──
//
// Each CMDB table the reconciler knows about is described by data, not code:
// its `(category, table)` path, its identity field, and the fields it
// accepts. The built-in catalog is embedded at compile time; users can layer
// their own on top.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::filter::normalize_key;

const BUILTIN_CATALOG: &str = include_str!("../catalog/resources.toml");

/// Schema of one CMDB table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    category: String,
    table: String,
    key: Option<String>,
    fields: BTreeSet<String>,
    description: Option<String>,
}

impl ResourceSchema {
    /// Build a schema. Names are normalized and the key is always allowed.
    pub fn new<I, S>(category: &str, table: &str, key: Option<&str>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = key.map(normalize_key);
        let mut fields: BTreeSet<String> =
            fields.into_iter().map(|f| normalize_key(f.as_ref())).collect();
        if let Some(ref key) = key {
            fields.insert(key.clone());
        }
        Self {
            category: normalize_key(category),
            table: normalize_key(table),
            key,
            fields,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `category.table`
    pub fn token(&self) -> String {
        format!("{}.{}", self.category, self.table)
    }

    /// Identity field, or `None` for singleton tables.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_singleton(&self) -> bool {
        self.key.is_none()
    }

    pub fn allowed_fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

// ── Catalog document ────────────────────────────────────────────────

/// One `[[resource]]` entry as written in a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub category: String,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl CatalogEntry {
    fn token(&self) -> String {
        format!(
            "{}.{}",
            normalize_key(&self.category),
            normalize_key(&self.table)
        )
    }

    fn to_schema(&self) -> Result<ResourceSchema, CoreError> {
        if self.category.trim().is_empty() || self.table.trim().is_empty() {
            return Err(CoreError::Catalog {
                message: format!(
                    "resource '{}' needs both a category and a table",
                    self.token()
                ),
            });
        }
        if self.key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(CoreError::Catalog {
                message: format!("resource '{}' has an empty key", self.token()),
            });
        }
        let schema = ResourceSchema::new(
            &self.category,
            &self.table,
            self.key.as_deref(),
            &self.fields,
        );
        Ok(match self.description {
            Some(ref d) => schema.with_description(d.clone()),
            None => schema,
        })
    }
}

/// A list of resource schemas as loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "resource")]
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        debug!(path = %path.display(), "loading resource catalog");
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source).map_err(|e| CoreError::Catalog {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Layer `other` on top of `self`. Entries with the same token replace
    /// the existing ones; new tokens are appended.
    pub fn merge(mut self, other: Catalog) -> Self {
        for entry in other.entries {
            let token = entry.token();
            match self.entries.iter_mut().find(|e| e.token() == token) {
                Some(existing) => *existing = entry,
                None => self.entries.push(entry),
            }
        }
        self
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// Token → schema lookup built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: HashMap<String, Arc<ResourceSchema>>,
}

impl Registry {
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, CoreError> {
        let mut schemas = HashMap::with_capacity(catalog.entries.len());
        for entry in &catalog.entries {
            let schema = entry.to_schema()?;
            let token = schema.token();
            if schemas.insert(token.clone(), Arc::new(schema)).is_some() {
                return Err(CoreError::Catalog {
                    message: format!("duplicate resource '{token}'"),
                });
            }
        }
        debug!(resources = schemas.len(), "resource registry built");
        Ok(Self { schemas })
    }

    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_catalog(&Catalog::builtin()?)
    }

    /// Find a schema by `category.table` token. Underscores are accepted in
    /// place of hyphens and matching is case-insensitive.
    pub fn lookup(&self, token: &str) -> Option<Arc<ResourceSchema>> {
        let token = normalize_key(token.trim()).to_ascii_lowercase();
        self.schemas.get(&token).cloned()
    }

    /// All schemas, sorted by token.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceSchema>> {
        let mut all: Vec<(&String, &Arc<ResourceSchema>)> = self.schemas.iter().collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all.into_iter().map(|(_, schema)| schema)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_catalog_loads() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(registry.len(), 10);

        let device = registry.lookup("user.device").unwrap();
        assert_eq!(device.category(), "user");
        assert_eq!(device.table(), "device");
        assert_eq!(device.key(), Some("alias"));
        assert!(device.allowed_fields().contains("master-device"));
    }

    #[test]
    fn singletons_have_no_key() {
        let registry = Registry::builtin().unwrap();
        for token in [
            "system.management-tunnel",
            "system.resource-limits",
            "wireless-controller.setting",
        ] {
            assert!(registry.lookup(token).unwrap().is_singleton(), "{token}");
        }
        assert!(!registry.lookup("system.storage").unwrap().is_singleton());
    }

    #[test]
    fn lookup_accepts_underscores() {
        let registry = Registry::builtin().unwrap();
        let schema = registry.lookup("dnsfilter.domain_filter").unwrap();
        assert_eq!(schema.token(), "dnsfilter.domain-filter");
        assert!(registry.lookup("firewall.policy").is_none());
    }

    #[test]
    fn key_is_always_allowed() {
        let schema = ResourceSchema::new("system", "storage", Some("name"), ["size"]);
        assert!(schema.allowed_fields().contains("name"));
        assert!(schema.allowed_fields().contains("size"));
    }

    #[test]
    fn iter_is_sorted_by_token() {
        let registry = Registry::builtin().unwrap();
        let tokens: Vec<String> = registry.iter().map(|s| s.token()).collect();
        let mut sorted = tokens.clone();
        sorted.sort();
        assert_eq!(tokens, sorted);
        assert_eq!(tokens.first().map(String::as_str), Some("dnsfilter.domain-filter"));
    }

    #[test]
    fn merge_overrides_and_extends() {
        let user = Catalog::from_toml_str(
            r#"
            [[resource]]
            category = "system"
            table = "storage"
            key = "name"
            fields = ["name", "size"]

            [[resource]]
            category = "firewall"
            table = "address"
            key = "name"
            fields = ["name", "subnet", "comment"]
            "#,
        )
        .unwrap();

        let merged = Catalog::builtin().unwrap().merge(user);
        let registry = Registry::from_catalog(&merged).unwrap();

        assert_eq!(registry.len(), 11);
        let storage = registry.lookup("system.storage").unwrap();
        assert_eq!(storage.allowed_fields().len(), 2);
        assert!(registry.lookup("firewall.address").is_some());
    }

    #[test]
    fn duplicate_tokens_are_rejected() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[resource]]
            category = "system"
            table = "storage"

            [[resource]]
            category = "system"
            table = "storage"
            "#,
        )
        .unwrap();

        let err = Registry::from_catalog(&catalog).unwrap_err();
        assert!(matches!(err, CoreError::Catalog { .. }));
    }

    #[test]
    fn malformed_toml_is_a_catalog_error() {
        let err = Catalog::from_toml_str("[[resource]]\ncategory = ").unwrap_err();
        assert!(matches!(err, CoreError::Catalog { .. }));
    }

    #[test]
    fn catalog_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.toml");
        std::fs::write(
            &path,
            "[[resource]]\ncategory = \"firewall\"\ntable = \"vip\"\nkey = \"name\"\n",
        )
        .unwrap();

        let catalog = Catalog::from_path(&path).unwrap();
        assert_eq!(catalog.entries.len(), 1);
        assert_eq!(catalog.entries[0].key.as_deref(), Some("name"));
    }
}
