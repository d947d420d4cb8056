//! Retain module - Three-way retention of observed metadata keys.
//!
//! Before the desired object is written to a member cluster, every key found
//! on the observed copy is classified against the desired keys and against
//! the managed set recorded on the observed copy during the previous cycle:
//!
//! - keys the desired object already carries are left alone,
//! - keys the control plane never managed are foreign and carried over,
//! - keys it managed but no longer wants are dropped.

use crate::managed::ManagedKeys;
use crate::object::{MetadataField, Object, StringMap};
use crate::MetadataError;
use tracing::{debug, debug_span};

/// Retention is the decision taken for one observed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// The desired object already has the key; its value wins.
    Keep,
    /// The key is foreign and is copied into the desired object.
    Copy,
    /// The key was previously managed and is no longer desired.
    Drop,
}

/// Classifies an observed key. Exactly one outcome applies to every key,
/// so the result does not depend on iteration order.
pub fn classify(key: &str, desired: &StringMap, managed: &ManagedKeys) -> Retention {
    if desired.contains_key(key) {
        Retention::Keep
    } else if !managed.contains(key) {
        Retention::Copy
    } else {
        Retention::Drop
    }
}

/// Returns the observed entries that must be carried into `desired`.
pub fn carry_over(desired: &StringMap, observed: &StringMap, managed: &ManagedKeys) -> StringMap {
    let mut carried = StringMap::new();
    for (key, value) in observed {
        let decision = classify(key, desired, managed);
        debug!(key = key.as_str(), ?decision, "classified observed key");
        if decision == Retention::Copy {
            carried.insert(key.clone(), value.clone());
        }
    }
    carried
}

/// Applies retention for one metadata container, mutating `desired` in place.
/// `annotation` names the managed-set annotation read from `observed`.
pub fn retain_field(
    desired: &mut Object,
    observed: &Object,
    field: MetadataField,
    annotation: &str,
) -> Result<(), MetadataError> {
    let observed_entries = match observed.string_map(field)? {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Ok(()),
    };
    let managed = ManagedKeys::from_object(observed, annotation)?;
    let current = desired.string_map(field)?.unwrap_or_default();

    let carried = debug_span!("retain", %field)
        .in_scope(|| carry_over(&current, &observed_entries, &managed));
    if carried.is_empty() {
        return Ok(());
    }

    let container = desired.string_map_or_insert(field)?;
    for (key, value) in carried {
        container.set(key, value);
    }
    Ok(())
}
