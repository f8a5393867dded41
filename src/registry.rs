//! Named schemas and descriptive metadata.
//!
//! A [`Registry`] stores schemas under names so definitions can refer to each
//! other, and keeps metadata keyed by name or by brand tag for exporters and
//! documentation tools.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SchemaError;
use crate::lazy::{failing, lazy};
use crate::schema::Schema;

/// Descriptive metadata; unrecognised fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl From<&str> for Metadata {
    fn from(description: &str) -> Self {
        Metadata::new().description(description)
    }
}

impl From<String> for Metadata {
    fn from(description: String) -> Self {
        Metadata::new().description(description)
    }
}

#[derive(Clone)]
struct Entry {
    schema: Schema,
    meta: Option<Metadata>,
}

/// A thread-safe store of named schemas and brand metadata.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<IndexMap<String, Entry>>,
    brands: RwLock<HashMap<String, Metadata>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under `name`. Names are unique.
    pub fn add(
        &self,
        name: impl Into<String>,
        schema: impl Into<Schema>,
        meta: Option<Metadata>,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        let mut entries = self.entries.write();
        if entries.contains_key(&name) {
            return Err(SchemaError::DuplicateName { name });
        }
        debug!(%name, "registering schema");
        entries.insert(
            name,
            Entry {
                schema: schema.into(),
                meta,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Schema> {
        self.entries
            .read()
            .get(name)
            .map(|entry| entry.schema.clone())
    }

    pub fn metadata(&self, name: &str) -> Option<Metadata> {
        self.entries
            .read()
            .get(name)
            .and_then(|entry| entry.meta.clone())
    }

    pub fn remove(&self, name: &str) -> Option<Schema> {
        self.entries
            .write()
            .shift_remove(name)
            .map(|entry| entry.schema)
    }

    /// Registered names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Attach metadata to every schema branded `tag`.
    pub fn describe_brand(&self, tag: impl Into<String>, meta: Metadata) {
        self.brands.write().insert(tag.into(), meta);
    }

    pub fn brand_metadata(&self, tag: &str) -> Option<Metadata> {
        self.brands.read().get(tag).cloned()
    }

    /// Metadata for `schema`: its brand's entry, then its own description,
    /// then the entry it was registered with.
    pub fn metadata_for(&self, schema: &Schema) -> Option<Metadata> {
        if let Some(meta) = schema.brand_tag().and_then(|tag| self.brand_metadata(tag)) {
            return Some(meta);
        }
        if let Some(meta) = schema.metadata() {
            return Some(meta.clone());
        }
        self.entries
            .read()
            .values()
            .find(|entry| entry.schema.ptr_eq(schema))
            .and_then(|entry| entry.meta.clone())
    }

    /// A schema that parses as whatever is registered under `name` at first
    /// use. An unknown name fails every parse.
    pub fn reference(self: &Arc<Self>, name: impl Into<String>) -> Schema {
        let registry: Weak<Registry> = Arc::downgrade(self);
        let name = name.into();
        lazy(move || {
            match registry.upgrade().and_then(|registry| registry.get(&name)) {
                Some(schema) => schema,
                None => unresolved(&name),
            }
        })
    }
}

fn unresolved(name: &str) -> Schema {
    failing(format!("unknown schema reference \"{}\"", name))
}

static GLOBAL: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// The process-wide registry.
pub fn global_registry() -> &'static Arc<Registry> {
    &GLOBAL
}
