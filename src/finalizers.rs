//! Order-preserving finalizer merging.
//!
//! Dependent controllers may rely on the relative position of finalizers, so
//! existing entries are never removed or reordered. New entries are only
//! appended.

use crate::object::Object;
use crate::MetadataError;
use std::collections::HashSet;

/// Returns `existing` followed by every entry of `incoming` not yet present,
/// in `incoming` order.
pub fn dedupe_and_merge_finalizers<E, N>(existing: &[E], incoming: &[N]) -> Vec<String>
where
    E: AsRef<str>,
    N: AsRef<str>,
{
    let mut merged: Vec<String> = existing.iter().map(|f| f.as_ref().to_string()).collect();
    let mut seen: HashSet<String> = merged.iter().cloned().collect();
    for finalizer in incoming {
        let finalizer = finalizer.as_ref();
        if seen.insert(finalizer.to_string()) {
            merged.push(finalizer.to_string());
        }
    }
    merged
}

/// Appends the entries of `incoming` missing from `metadata.finalizers`.
/// Nothing is written when the object has no finalizers and `incoming` is
/// empty.
pub fn merge_finalizers<N: AsRef<str>>(obj: &mut Object, incoming: &[N]) -> Result<(), MetadataError> {
    let existing = obj.finalizers()?;
    if existing.is_none() && incoming.is_empty() {
        return Ok(());
    }
    let merged = dedupe_and_merge_finalizers(&existing.unwrap_or_default(), incoming);
    obj.set_finalizers(merged)
}

/// Keeps the finalizers already present on the member cluster, in their
/// observed order, and appends the desired ones that are missing.
pub fn retain_finalizers(desired: &mut Object, observed: &Object) -> Result<(), MetadataError> {
    let Some(observed_finalizers) = observed.finalizers()? else {
        return Ok(());
    };
    let wanted = desired.finalizers()?.unwrap_or_default();
    let merged = dedupe_and_merge_finalizers(&observed_finalizers, &wanted);
    tracing::debug!(
        kind = desired.kind().unwrap_or_default(),
        name = desired.name().unwrap_or_default(),
        count = merged.len(),
        "retained observed finalizers"
    );
    desired.set_finalizers(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BINDING_CONTROLLER: &str = "karmada.io/binding-controller";
    const DEPENDENCIES_DISTRIBUTOR: &str = "karmada.io/binding-dependencies-distributor";

    #[test]
    fn test_dedupe_and_merge_finalizers() {
        let cases: Vec<(&str, Vec<&str>, Vec<&str>, Vec<&str>)> = vec![
            (
                "existFinalizers is empty",
                vec![],
                vec![BINDING_CONTROLLER],
                vec![BINDING_CONTROLLER],
            ),
            (
                "newFinalizers is empty",
                vec![BINDING_CONTROLLER],
                vec![],
                vec![BINDING_CONTROLLER],
            ),
            (
                "binding-controller in front of binding-dependencies-distributor",
                vec![BINDING_CONTROLLER, DEPENDENCIES_DISTRIBUTOR],
                vec![BINDING_CONTROLLER],
                vec![BINDING_CONTROLLER, DEPENDENCIES_DISTRIBUTOR],
            ),
            (
                "binding-dependencies-distributor in front of binding-controller",
                vec![DEPENDENCIES_DISTRIBUTOR, BINDING_CONTROLLER],
                vec![BINDING_CONTROLLER],
                vec![DEPENDENCIES_DISTRIBUTOR, BINDING_CONTROLLER],
            ),
            (
                "new finalizers have all finalizers",
                vec![DEPENDENCIES_DISTRIBUTOR, BINDING_CONTROLLER],
                vec![BINDING_CONTROLLER, DEPENDENCIES_DISTRIBUTOR],
                vec![DEPENDENCIES_DISTRIBUTOR, BINDING_CONTROLLER],
            ),
            (
                "existFinalizers have only one item",
                vec![DEPENDENCIES_DISTRIBUTOR],
                vec![BINDING_CONTROLLER, DEPENDENCIES_DISTRIBUTOR],
                vec![DEPENDENCIES_DISTRIBUTOR, BINDING_CONTROLLER],
            ),
            ("reversed pair", vec!["b", "a"], vec!["a", "b"], vec!["b", "a"]),
            (
                "incoming duplicates collapse",
                vec!["x"],
                vec!["y", "y", "x", "z"],
                vec!["x", "y", "z"],
            ),
        ];

        for (name, existing, incoming, want) in cases {
            assert_eq!(
                dedupe_and_merge_finalizers(&existing, &incoming),
                want,
                "case: {}",
                name
            );
        }
    }

    #[test]
    fn test_existing_entries_are_copied_verbatim() {
        // duplicates already present are not collapsed
        assert_eq!(
            dedupe_and_merge_finalizers(&["a", "a"], &["a", "b"]),
            vec!["a", "a", "b"]
        );
    }

    #[test]
    fn test_merge_finalizers_on_object() {
        let mut obj = Object::from_yaml(
            r#"
metadata:
  name: demo
  finalizers:
  - karmada.io/binding-dependencies-distributor
"#,
        )
        .unwrap();
        merge_finalizers(&mut obj, &[BINDING_CONTROLLER, DEPENDENCIES_DISTRIBUTOR]).unwrap();
        assert_eq!(
            obj.finalizers().unwrap(),
            Some(vec![
                DEPENDENCIES_DISTRIBUTOR.to_string(),
                BINDING_CONTROLLER.to_string()
            ])
        );
    }

    #[test]
    fn test_merge_finalizers_empty_is_noop() {
        let mut obj = Object::from_yaml("metadata:\n  name: demo\n").unwrap();
        let before = obj.clone();
        merge_finalizers::<&str>(&mut obj, &[]).unwrap();
        assert_eq!(obj, before);
    }

    #[test]
    fn test_retain_finalizers() {
        let observed = Object::from_yaml(
            r#"
metadata:
  finalizers:
  - member.io/cleanup
  - karmada.io/binding-controller
"#,
        )
        .unwrap();
        let mut desired = Object::from_yaml(
            r#"
metadata:
  finalizers:
  - karmada.io/binding-controller
  - karmada.io/binding-dependencies-distributor
"#,
        )
        .unwrap();

        retain_finalizers(&mut desired, &observed).unwrap();
        assert_eq!(
            desired.finalizers().unwrap(),
            Some(vec![
                "member.io/cleanup".to_string(),
                BINDING_CONTROLLER.to_string(),
                DEPENDENCIES_DISTRIBUTOR.to_string(),
            ])
        );

        let mut untouched = Object::from_yaml("metadata:\n  name: demo\n").unwrap();
        retain_finalizers(&mut untouched, &Object::default()).unwrap();
        assert_eq!(untouched.finalizers().unwrap(), None);
    }
}
