//! Managed module - The set of metadata keys owned by the control plane.
//!
//! The set travels between reconciliation cycles inside a single annotation
//! whose value is the comma-joined list of keys. That string is only ever
//! parsed or produced here; everything else works on [`ManagedKeys`].

use crate::object::{MetadataField, Object};
use crate::MetadataError;
use std::collections::BTreeSet;
use std::fmt;

/// Annotation recording the label keys applied by the control plane.
pub const MANAGED_LABELS_ANNOTATION: &str = "resourcetemplate.karmada.io/managed-labels";

/// Annotation recording the annotation keys applied by the control plane.
pub const MANAGED_ANNOTATIONS_ANNOTATION: &str = "resourcetemplate.karmada.io/managed-annotations";

const SEPARATOR: &str = ",";

/// ManagedKeys is the decoded value of a managed-keys annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedKeys {
    keys: BTreeSet<String>,
}

impl ManagedKeys {
    pub fn new() -> Self {
        ManagedKeys {
            keys: BTreeSet::new(),
        }
    }

    /// Decodes an annotation value. Empty segments are ignored, so both the
    /// empty string and stray separators yield no keys.
    pub fn decode(raw: &str) -> Self {
        raw.split(SEPARATOR)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Encodes the set as an annotation value. Keys are emitted sorted so
    /// equal sets always encode to the same string.
    pub fn encode(&self) -> String {
        self.keys
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// Reads the managed set stored on `obj` under `annotation`. A missing
    /// annotation, or an object without annotations, is an empty set.
    pub fn from_object(obj: &Object, annotation: &str) -> Result<Self, MetadataError> {
        let annotations = obj.annotations()?;
        Ok(annotations
            .as_ref()
            .and_then(|a| a.get(annotation))
            .map(|raw| ManagedKeys::decode(raw))
            .unwrap_or_default())
    }

    /// Writes the set to `obj` under `annotation`, creating the annotation
    /// container if needed.
    pub fn stamp(&self, obj: &mut Object, annotation: &str) -> Result<(), MetadataError> {
        let encoded = self.encode();
        tracing::debug!(
            kind = obj.kind().unwrap_or_default(),
            name = obj.name().unwrap_or_default(),
            annotation,
            keys = %encoded,
            "recording managed keys"
        );
        obj.string_map_or_insert(MetadataField::Annotations)?
            .set(annotation, encoded);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<String> for ManagedKeys {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        ManagedKeys {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for ManagedKeys {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

impl fmt::Display for ManagedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}
