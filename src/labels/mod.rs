//! Labels module - Bookkeeping for `metadata.labels`.
//!
//! The control plane stamps its own labels on every propagated object and
//! must not clobber labels that other actors add on the member cluster. The
//! functions here read, merge and remove labels, record which label keys
//! were applied, and carry foreign labels over from the observed object.

use crate::managed::{ManagedKeys, MANAGED_LABELS_ANNOTATION};
use crate::object::{self, MetadataField, Object, StringMap};
use crate::retain;
use crate::MetadataError;


/// Returns the value of label `key`, or the empty string when the labels
/// are absent, the key is empty or the key is not set.
pub fn label_value<'a>(labels: Option<&'a StringMap>, key: &str) -> &'a str {
    object::string_value(labels, key)
}

/// Sets label `key` to `value` on `obj`, creating the label container if needed.
pub fn merge_label(obj: &mut Object, key: &str, value: &str) -> Result<(), MetadataError> {
    obj.merge_entries(MetadataField::Labels, [(key, value)])
}

/// Sets every label in `labels` on `obj`.
pub fn merge_labels(obj: &mut Object, labels: &StringMap) -> Result<(), MetadataError> {
    obj.merge_entries(
        MetadataField::Labels,
        labels.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    )
}

/// Returns the union of two label sets. Values from `incoming` win on conflict.
pub fn dedupe_and_merge_labels(existing: &StringMap, incoming: &StringMap) -> StringMap {
    object::union_string_maps(existing, incoming)
}

/// Deletes the given label keys from `obj`.
pub fn remove_labels<I, S>(obj: &mut Object, keys: I) -> Result<(), MetadataError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    obj.remove_entries(MetadataField::Labels, keys)
}

/// Records the current label keys of `obj` in the managed-labels annotation.
///
/// Call this once the label set of the desired object is final for the
/// cycle; the next cycle uses the record to tell its own labels from foreign
/// ones.
pub fn record_managed_labels(obj: &mut Object) -> Result<(), MetadataError> {
    let managed: ManagedKeys = obj.labels()?.unwrap_or_default().into_keys().collect();
    managed.stamp(obj, MANAGED_LABELS_ANNOTATION)
}

/// Carries foreign labels from `observed` into `desired` and leaves out
/// labels this control plane applied previously but no longer wants.
/// Labels already present on `desired` are never overwritten.
pub fn retain_labels(desired: &mut Object, observed: &Object) -> Result<(), MetadataError> {
    retain::retain_field(
        desired,
        observed,
        MetadataField::Labels,
        MANAGED_LABELS_ANNOTATION,
    )
}
