//! Structural diff between a source tree and a target tree.

use crate::tree::{KeyPath, Tree, Value};

/// Returns the paths of every source leaf the target lacks, in pre-order of
/// the source keys.
///
/// A leaf counts as present when the target holds a value of the same kind at
/// the same key; differing content is not reported. Null source values are
/// skipped. When the target has anything other than a subtree where the
/// source has one, every leaf of that source subtree is reported.
pub fn diff(source: &Tree, target: &Tree) -> Vec<KeyPath> {
    let mut missing = Vec::new();
    let mut prefix = Vec::new();
    diff_into(source, Some(target), &mut prefix, &mut missing);
    missing
}

fn diff_into(
    source: &Tree,
    target: Option<&Tree>,
    prefix: &mut Vec<String>,
    missing: &mut Vec<KeyPath>,
) {
    let Some(target) = target else {
        collect_leaves(source, prefix, missing);
        return;
    };
    for (key, value) in source {
        match value {
            Value::Null => {}
            Value::Tree(subtree) => {
                prefix.push(key.clone());
                diff_into(
                    subtree,
                    target.get(key).and_then(Value::as_tree),
                    prefix,
                    missing,
                );
                prefix.pop();
            }
            leaf => {
                let satisfied = target
                    .get(key)
                    .is_some_and(|existing| existing.kind() == leaf.kind());
                if !satisfied {
                    missing.push(KeyPath::child(prefix, key));
                }
            }
        }
    }
}

/// Every non-null leaf under `source`, prefixed with `prefix`.
fn collect_leaves(source: &Tree, prefix: &mut Vec<String>, out: &mut Vec<KeyPath>) {
    for (key, value) in source {
        match value {
            Value::Null => {}
            Value::Tree(subtree) => {
                prefix.push(key.clone());
                collect_leaves(subtree, prefix, out);
                prefix.pop();
            }
            _ => out.push(KeyPath::child(prefix, key)),
        }
    }
}
