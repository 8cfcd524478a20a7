use crate::tree::{KeyPath, Tree, Value};

/// Writes `value` at `path`, replacing anything that is not a subtree along
/// the way with an empty one. The final segment is overwritten.
pub fn merge(target: &mut Tree, path: &KeyPath, value: Value) {
    merge_at(target, path.segments(), value);
}

fn merge_at(node: &mut Tree, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [last] => {
            node.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let slot = node.entry(head.clone()).or_insert(Value::Null);
            match slot {
                Value::Tree(child) => merge_at(child, rest, value),
                other => {
                    let mut child = Tree::new();
                    merge_at(&mut child, rest, value);
                    *other = Value::Tree(child);
                }
            }
        }
    }
}
