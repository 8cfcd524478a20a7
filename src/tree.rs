//! Localization document model.
//!
//! A [`Tree`] maps string keys to [`Value`]s and keeps insertion order so
//! that written files come out in the same order they were read.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

pub type Tree = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Intentionally untranslated entry; never reported as missing.
    Null,
    Text(String),
    List(Vec<String>),
    Tree(Tree),
    /// Numbers, booleans, tagged values and sequences that are not all
    /// strings. Copied as they are, never translated.
    Raw(RawValue),
}

/// A value kept exactly as its format parsed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Json(serde_json::Value),
    Yaml(serde_yaml::Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Text,
    List,
    Tree,
    Raw,
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(values.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Text(_) => ValueKind::Text,
            Value::List(_) => ValueKind::List,
            Value::Tree(_) => ValueKind::Tree,
            Value::Raw(_) => ValueKind::Raw,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Value::Text(_) | Value::List(_) | Value::Raw(_))
    }

    /// Whether a missing entry of this value needs a translation, as opposed
    /// to a verbatim copy.
    pub fn is_translatable(&self) -> bool {
        matches!(self, Value::Text(_) | Value::List(_))
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Value::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::String(text) => Value::Text(text),
            serde_json::Value::Array(items) if items.iter().all(serde_json::Value::is_string) => {
                Value::List(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            serde_json::Value::String(text) => Some(text),
                            _ => None,
                        })
                        .collect(),
                )
            }
            serde_json::Value::Object(map) => Value::Tree(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from_json(value)))
                    .collect(),
            ),
            other => Value::Raw(RawValue::Json(other)),
        }
    }

    /// Builds a value from parsed YAML. Non-string mapping keys are rendered
    /// as text.
    pub fn from_yaml(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::String(text) => Value::Text(text),
            serde_yaml::Value::Sequence(items) if items.iter().all(serde_yaml::Value::is_string) => {
                Value::List(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            serde_yaml::Value::String(text) => Some(text),
                            _ => None,
                        })
                        .collect(),
                )
            }
            serde_yaml::Value::Mapping(map) => Value::Tree(
                map.into_iter()
                    .filter_map(|(key, value)| yaml_key(key).map(|key| (key, Value::from_yaml(value))))
                    .collect(),
            ),
            other => Value::Raw(RawValue::Yaml(other)),
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(text) => Some(text),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        _ => None,
    }
}

/// Location of a leaf inside a [`Tree`]. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    pub(crate) fn child(prefix: &[String], key: &str) -> Self {
        let mut segments = prefix.to_vec();
        segments.push(key.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Walks `tree` along `path` and returns the value at its end.
pub fn lookup<'a>(tree: &'a Tree, path: &KeyPath) -> Option<&'a Value> {
    let (last, parents) = path.segments().split_last()?;
    let mut node = tree;
    for segment in parents {
        node = node.get(segment)?.as_tree()?;
    }
    node.get(last)
}
