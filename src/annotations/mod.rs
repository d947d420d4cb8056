//! Annotations module - Bookkeeping for `metadata.annotations`.
//!
//! Same contract as the labels module, tracked through its own managed-set
//! annotation. That annotation lists itself, and it also lists the
//! managed-labels annotation when labels were recorded first.

use crate::managed::{ManagedKeys, MANAGED_ANNOTATIONS_ANNOTATION};
use crate::object::{self, MetadataField, Object, StringMap};
use crate::retain;
use crate::MetadataError;


/// Returns the value of annotation `key`, or the empty string when it is
/// not set.
pub fn annotation_value<'a>(annotations: Option<&'a StringMap>, key: &str) -> &'a str {
    object::string_value(annotations, key)
}

/// Sets annotation `key` to `value` on `obj`.
pub fn merge_annotation(obj: &mut Object, key: &str, value: &str) -> Result<(), MetadataError> {
    obj.merge_entries(MetadataField::Annotations, [(key, value)])
}

/// Sets every annotation in `annotations` on `obj`.
pub fn merge_annotations(obj: &mut Object, annotations: &StringMap) -> Result<(), MetadataError> {
    obj.merge_entries(
        MetadataField::Annotations,
        annotations.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    )
}

/// Returns the union of two annotation sets, `incoming` winning on conflict.
pub fn dedupe_and_merge_annotations(existing: &StringMap, incoming: &StringMap) -> StringMap {
    object::union_string_maps(existing, incoming)
}

/// Deletes the given annotation keys from `obj`.
pub fn remove_annotations<I, S>(obj: &mut Object, keys: I) -> Result<(), MetadataError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    obj.remove_entries(MetadataField::Annotations, keys)
}

/// Records the current annotation keys of `obj`, including the record itself.
pub fn record_managed_annotations(obj: &mut Object) -> Result<(), MetadataError> {
    let mut managed: ManagedKeys = obj
        .annotations()?
        .unwrap_or_default()
        .into_keys()
        .collect();
    managed.insert(MANAGED_ANNOTATIONS_ANNOTATION);
    managed.stamp(obj, MANAGED_ANNOTATIONS_ANNOTATION)
}

/// Carries foreign annotations from `observed` into `desired`, leaving out
/// annotations that were managed before and are no longer desired.
pub fn retain_annotations(desired: &mut Object, observed: &Object) -> Result<(), MetadataError> {
    retain::retain_field(
        desired,
        observed,
        MetadataField::Annotations,
        MANAGED_ANNOTATIONS_ANNOTATION,
    )
}
