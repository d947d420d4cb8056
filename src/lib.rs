//! # Label Reconcile
//!
//! Label, annotation and finalizer bookkeeping for resources that a
//! multi-cluster control plane propagates to member clusters.
//!
//! Every operation mutates an in-memory [`Object`] supplied by the caller.
//! The library keeps no state between calls and performs no I/O.
//!
//! A reconciliation cycle looks like this:
//!
//! 1. render the desired object and record its managed labels and
//!    annotations ([`record_managed_labels`], [`record_managed_annotations`]),
//! 2. carry over foreign metadata from the previously observed object
//!    ([`retain_labels`], [`retain_annotations`], [`retain_finalizers`]),
//! 3. write the desired object to the member cluster.
//!
//! ## Modules
//!
//! - [`value`] - In-memory resource trees and YAML/JSON conversion
//! - [`object`] - Metadata accessors for a single resource
//! - [`managed`] - The managed-keys annotations
//! - [`retain`] - Three-way retention of observed keys
//! - [`labels`] - Label helpers
//! - [`annotations`] - Annotation helpers
//! - [`finalizers`] - Order-preserving finalizer merging

pub mod annotations;
pub mod finalizers;
pub mod labels;
pub mod managed;
pub mod object;
pub mod retain;
pub mod value;

mod error;

pub use annotations::{
    annotation_value, dedupe_and_merge_annotations, merge_annotation, merge_annotations,
    record_managed_annotations, remove_annotations, retain_annotations,
};
pub use error::MetadataError;
pub use finalizers::{dedupe_and_merge_finalizers, merge_finalizers, retain_finalizers};
pub use labels::{
    dedupe_and_merge_labels, label_value, merge_label, merge_labels, record_managed_labels,
    remove_labels, retain_labels,
};
pub use managed::{ManagedKeys, MANAGED_ANNOTATIONS_ANNOTATION, MANAGED_LABELS_ANNOTATION};
pub use object::{MetadataField, Object, StringMap};
pub use retain::{classify, Retention};
pub use value::Value;

/// Runs a full bookkeeping cycle on `desired` against the previously
/// observed copy. `desired` must hold only the metadata the control plane
/// wants; the managed sets are recorded from it before anything is carried
/// over, so foreign keys never end up in the records.
pub fn reconcile(desired: &mut Object, observed: &Object) -> Result<(), MetadataError> {
    record_managed_labels(desired)?;
    record_managed_annotations(desired)?;
    retain_labels(desired, observed)?;
    retain_annotations(desired, observed)?;
    retain_finalizers(desired, observed)
}
