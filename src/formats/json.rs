use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::tree::{Tree, Value};

pub(super) fn parse(path: &Path, content: &str) -> SyncResult<Tree> {
    let document: serde_json::Value =
        serde_json::from_str(content).map_err(|err| SyncError::parse(path, err))?;
    match Value::from_json(document) {
        Value::Null => Ok(Tree::new()),
        Value::Tree(tree) => Ok(tree),
        _ => Err(SyncError::parse(path, "top-level document must be an object")),
    }
}

pub(super) fn render(path: &Path, tree: &Tree) -> SyncResult<String> {
    let mut rendered =
        serde_json::to_string_pretty(tree).map_err(|err| SyncError::parse(path, err))?;
    rendered.push('\n');
    Ok(rendered)
}
