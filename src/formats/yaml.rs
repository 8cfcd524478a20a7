use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::tree::{Tree, Value};

pub(super) fn parse(path: &Path, content: &str) -> SyncResult<Tree> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|err| SyncError::parse(path, err))?;
    match Value::from_yaml(document) {
        Value::Null => Ok(Tree::new()),
        Value::Tree(tree) => Ok(tree),
        _ => Err(SyncError::parse(path, "top-level document must be a mapping")),
    }
}

pub(super) fn render(path: &Path, tree: &Tree) -> SyncResult<String> {
    serde_yaml::to_string(tree).map_err(|err| SyncError::parse(path, err))
}
