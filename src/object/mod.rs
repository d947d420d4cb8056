//! Object module - A single resource and accessors for its metadata.
//!
//! Only `metadata.labels`, `metadata.annotations` and `metadata.finalizers`
//! are ever written. Containers are created lazily by the mutating accessors
//! and are never pruned once empty.

use crate::value::{self, Map, Value};
use crate::MetadataError;
use std::collections::BTreeMap;
use std::fmt;

/// StringMap is a flat string-to-string mapping such as a label or
/// annotation set.
pub type StringMap = BTreeMap<String, String>;

/// Returns the value stored under `key`, or the empty string when the map
/// is absent, the key is empty or the key is not set.
pub fn string_value<'a>(map: Option<&'a StringMap>, key: &str) -> &'a str {
    if key.is_empty() {
        return "";
    }
    map.and_then(|map| map.get(key))
        .map(String::as_str)
        .unwrap_or_default()
}

/// Returns the union of two string maps. Values from `incoming` win.
pub fn union_string_maps(existing: &StringMap, incoming: &StringMap) -> StringMap {
    let mut merged = existing.clone();
    merged.extend(incoming.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

const METADATA: &str = "metadata";
const METADATA_PATH: &str = ".metadata";
const FINALIZERS: &str = "finalizers";
const FINALIZERS_PATH: &str = ".metadata.finalizers";

/// MetadataField names one of the string-map containers under `metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Labels,
    Annotations,
}

impl MetadataField {
    /// Returns the key of the container under `metadata`.
    pub fn key(&self) -> &'static str {
        match self {
            MetadataField::Labels => "labels",
            MetadataField::Annotations => "annotations",
        }
    }

    /// Returns the full path of the container, for error messages.
    pub fn path(&self) -> &'static str {
        match self {
            MetadataField::Labels => ".metadata.labels",
            MetadataField::Annotations => ".metadata.annotations",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Object wraps the tree of a single Kubernetes-style resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    root: Value,
}

impl Object {
    /// Creates an object from an already parsed tree.
    pub fn new(root: Value) -> Self {
        Object { root }
    }

    /// Parses an object from YAML (or JSON, which YAML accepts).
    pub fn from_yaml(yaml: &str) -> Result<Object, MetadataError> {
        Ok(Object::new(value::from_yaml(yaml)?))
    }

    pub fn to_yaml(&self) -> Result<String, MetadataError> {
        Ok(value::to_yaml(&self.root)?)
    }

    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(value::to_json_pretty(&self.root)?)
    }

    /// Reports whether the tree is empty, as parsed from an empty document.
    pub fn is_null(&self) -> bool {
        self.root.is_null()
    }

    pub fn kind(&self) -> Option<&str> {
        self.root.as_map()?.get("kind")?.as_str()
    }

    pub fn name(&self) -> Option<&str> {
        self.root
            .as_map()?
            .get(METADATA)?
            .as_map()?
            .get("name")?
            .as_str()
    }

    /// Returns the object's labels, or `None` when it has no label container.
    pub fn labels(&self) -> Result<Option<StringMap>, MetadataError> {
        self.string_map(MetadataField::Labels)
    }

    /// Returns the object's annotations, or `None` when it has none.
    pub fn annotations(&self) -> Result<Option<StringMap>, MetadataError> {
        self.string_map(MetadataField::Annotations)
    }

    /// Reads a metadata string map, checking every entry is a string.
    pub fn string_map(&self, field: MetadataField) -> Result<Option<StringMap>, MetadataError> {
        let Some(container) = self.existing_container(field.key())? else {
            return Ok(None);
        };
        let map = match container {
            Value::Map(m) => m,
            other => {
                return Err(MetadataError::type_mismatch(
                    field.path(),
                    "map",
                    other.type_name(),
                ))
            }
        };

        let mut out = StringMap::new();
        for (key, value) in map.iter() {
            match value {
                Value::String(s) => {
                    out.insert(key.clone(), s.clone());
                }
                other => {
                    return Err(MetadataError::type_mismatch(
                        format!("{}.{}", field.path(), key),
                        "string",
                        other.type_name(),
                    ))
                }
            }
        }
        Ok(Some(out))
    }

    /// Returns the existing container for `field` without creating it.
    pub fn string_map_mut(&mut self, field: MetadataField) -> Result<Option<&mut Map>, MetadataError> {
        let Some(metadata) = self.existing_metadata_mut()? else {
            return Ok(None);
        };
        match metadata.get_mut(field.key()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Map(m)) => Ok(Some(m)),
            Some(other) => Err(MetadataError::type_mismatch(
                field.path(),
                "map",
                other.type_name(),
            )),
        }
    }

    /// Returns the container for `field`, creating `metadata` and the
    /// container itself when they are absent.
    pub fn string_map_or_insert(&mut self, field: MetadataField) -> Result<&mut Map, MetadataError> {
        self.metadata_or_insert()?
            .child_map_or_insert(field.key(), field.path())
    }

    /// Sets every entry of `entries` in the `field` container, overwriting
    /// existing values. Nothing is created when `entries` is empty.
    pub fn merge_entries<'a, I>(&mut self, field: MetadataField, entries: I) -> Result<(), MetadataError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return Ok(());
        }
        let container = self.string_map_or_insert(field)?;
        for (key, value) in entries {
            container.set(key, value);
        }
        Ok(())
    }

    /// Deletes `keys` from the `field` container. Missing keys are ignored and
    /// the container is kept even when it ends up empty.
    pub fn remove_entries<I, S>(&mut self, field: MetadataField, keys: I) -> Result<(), MetadataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return Ok(());
        }
        if let Some(container) = self.string_map_mut(field)? {
            for key in keys {
                container.delete(key.as_ref());
            }
        }
        Ok(())
    }

    /// Returns `metadata.finalizers`, or `None` when the list is absent.
    pub fn finalizers(&self) -> Result<Option<Vec<String>>, MetadataError> {
        let Some(list) = self.existing_container(FINALIZERS)? else {
            return Ok(None);
        };
        let items = list.as_list().ok_or_else(|| {
            MetadataError::type_mismatch(FINALIZERS_PATH, "list", list.type_name())
        })?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    MetadataError::type_mismatch(
                        format!("{}[{}]", FINALIZERS_PATH, i),
                        "string",
                        item.type_name(),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Replaces `metadata.finalizers` with the given list.
    pub fn set_finalizers(&mut self, finalizers: Vec<String>) -> Result<(), MetadataError> {
        let list = finalizers.into_iter().map(Value::String).collect::<Vec<_>>();
        self.metadata_or_insert()?.set(FINALIZERS, list);
        Ok(())
    }

    fn existing_container(&self, key: &str) -> Result<Option<&Value>, MetadataError> {
        let root = match &self.root {
            Value::Null => return Ok(None),
            Value::Map(m) => m,
            other => return Err(MetadataError::type_mismatch(".", "map", other.type_name())),
        };
        let metadata = match root.get(METADATA) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Map(m)) => m,
            Some(other) => {
                return Err(MetadataError::type_mismatch(
                    METADATA_PATH,
                    "map",
                    other.type_name(),
                ))
            }
        };
        match metadata.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(value)),
        }
    }

    fn existing_metadata_mut(&mut self) -> Result<Option<&mut Map>, MetadataError> {
        let root = match &mut self.root {
            Value::Null => return Ok(None),
            Value::Map(m) => m,
            other => return Err(MetadataError::type_mismatch(".", "map", other.type_name())),
        };
        match root.get_mut(METADATA) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Map(m)) => Ok(Some(m)),
            Some(other) => Err(MetadataError::type_mismatch(
                METADATA_PATH,
                "map",
                other.type_name(),
            )),
        }
    }

    fn metadata_or_insert(&mut self) -> Result<&mut Map, MetadataError> {
        if self.root.is_null() {
            self.root = Value::Map(Map::new());
        }
        let root = match &mut self.root {
            Value::Map(m) => m,
            other => return Err(MetadataError::type_mismatch(".", "map", other.type_name())),
        };
        root.child_map_or_insert(METADATA, METADATA_PATH)
    }
}
