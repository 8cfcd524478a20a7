use tracing::{debug, info};

use crate::cache::{LanguagePair, TranslationCache};
use crate::diff::diff;
use crate::error::{SyncError, SyncResult};
use crate::merge::merge;
use crate::pool::ClientPool;
use crate::providers::TranslationProvider;
use crate::tree::{KeyPath, Tree, Value, lookup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub tree: Tree,
    pub filled: Vec<KeyPath>,
}

/// Fills every entry `target` lacks relative to `source`.
///
/// The first failing translation aborts the pass and nothing from it is
/// returned. A fresh cache is used per call.
pub async fn sync_tree<P: TranslationProvider>(
    source: &Tree,
    target: Tree,
    pool: &mut ClientPool<P>,
    languages: &LanguagePair<'_>,
) -> SyncResult<SyncOutcome> {
    let mut cache = TranslationCache::new();
    sync_tree_with_cache(source, target, pool, languages, &mut cache).await
}

pub async fn sync_tree_with_cache<P: TranslationProvider>(
    source: &Tree,
    mut target: Tree,
    pool: &mut ClientPool<P>,
    languages: &LanguagePair<'_>,
    cache: &mut TranslationCache,
) -> SyncResult<SyncOutcome> {
    let missing = diff(source, &target);
    info!(
        "{} Missing keys: [{}]",
        languages.label,
        missing
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    for path in &missing {
        let leaf = source_leaf(source, path)?;
        let value = if leaf.is_translatable() {
            cache.resolve(leaf, pool, languages).await?
        } else {
            debug!("{} Copying '{}' unchanged", languages.label, path);
            leaf.clone()
        };
        merge(&mut target, path, value);
    }
    Ok(SyncOutcome {
        tree: target,
        filled: missing,
    })
}

fn source_leaf<'a>(source: &'a Tree, path: &KeyPath) -> SyncResult<&'a Value> {
    lookup(source, path)
        .filter(|value| value.is_leaf())
        .ok_or_else(|| SyncError::UnresolvedPath(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ScriptedProvider;
    use crate::tree::Value;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Tree {
        match Value::from_json(value) {
            Value::Tree(tree) => tree,
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fills_missing_entries_and_keeps_existing_ones() {
        let provider = ScriptedProvider::new("p", 1000);
        let mut pool = ClientPool::new(vec![provider.clone()]);
        let source = tree(json!({
            "greeting": "Hello",
            "menu": {"open": "Open", "close": "Close"},
            "days": ["Mon", "Tue"],
            "skip": null
        }));
        let target = tree(json!({"greeting": "Bonjour", "menu": {"open": "Ouvrir"}}));

        let outcome = sync_tree(&source, target, &mut pool, &LanguagePair::new("en", "fr"))
            .await
            .unwrap();
        assert_eq!(
            outcome.tree,
            tree(json!({
                "greeting": "Bonjour",
                "menu": {"open": "Ouvrir", "close": "fr:Close"},
                "days": ["fr:Mon", "fr:Tue"]
            }))
        );
        assert_eq!(
            outcome.filled.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["menu.close", "days"]
        );
        assert!(diff(&source, &outcome.tree).is_empty());
    }

    #[tokio::test]
    async fn identical_strings_are_translated_once() {
        let provider = ScriptedProvider::new("p", 1000);
        let mut pool = ClientPool::new(vec![provider.clone()]);
        let source = tree(json!({"a": "Hello", "b": {"c": "Hello"}, "d": ["Hello", "World"]}));

        let outcome = sync_tree(&source, Tree::new(), &mut pool, &LanguagePair::new("en", "es"))
            .await
            .unwrap();
        assert_eq!(outcome.tree["a"], Value::text("es:Hello"));
        assert_eq!(
            outcome.tree["b"].as_tree().unwrap()["c"],
            Value::text("es:Hello")
        );
        assert_eq!(outcome.tree["d"], Value::list(["es:Hello", "es:World"]));
        assert_eq!(provider.calls(), vec!["Hello".to_string(), "World".to_string()]);
    }

    #[tokio::test]
    async fn each_pass_starts_with_an_empty_cache() {
        let provider = ScriptedProvider::new("p", 1000);
        let mut pool = ClientPool::new(vec![provider.clone()]);
        let source = tree(json!({"a": "Hello"}));

        sync_tree(&source, Tree::new(), &mut pool, &LanguagePair::new("en", "fr"))
            .await
            .unwrap();
        sync_tree(&source, Tree::new(), &mut pool, &LanguagePair::new("en", "de"))
            .await
            .unwrap();
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test]
    async fn first_failure_aborts_the_pass() {
        let mut pool = ClientPool::new(vec![ScriptedProvider::new("p", 6)]);
        let source = tree(json!({"a": "Hello", "b": "World"}));
        let result = sync_tree(&source, Tree::new(), &mut pool, &LanguagePair::new("en", "fr")).await;
        assert!(matches!(result, Err(SyncError::Usage(_))));
    }

    #[tokio::test]
    async fn spreads_work_across_providers_by_quota() {
        let first = ScriptedProvider::new("first", 6);
        let second = ScriptedProvider::new("second", 5);
        let mut pool = ClientPool::new(vec![first.clone(), second.clone()]);
        let source = tree(json!({"a": "Hello", "b": "World"}));

        sync_tree(&source, Tree::new(), &mut pool, &LanguagePair::new("en", "fr"))
            .await
            .unwrap();
        assert_eq!(first.calls(), vec!["Hello".to_string()]);
        assert_eq!(second.calls(), vec!["World".to_string()]);
    }

    #[tokio::test]
    async fn nothing_missing_means_no_provider_traffic() {
        let provider = ScriptedProvider::new("p", 0);
        let mut pool = ClientPool::new(vec![provider.clone()]);
        let source = tree(json!({"a": "Hello"}));
        let target = tree(json!({"a": "Hallo"}));
        let outcome = sync_tree(&source, target.clone(), &mut pool, &LanguagePair::new("en", "de"))
            .await
            .unwrap();
        assert_eq!(outcome.tree, target);
        assert!(outcome.filled.is_empty());
        assert_eq!(provider.usage_checks(), 0);
    }

    #[tokio::test]
    async fn numbers_and_booleans_are_copied_without_translation() {
        let provider = ScriptedProvider::new("p", 0);
        let mut pool = ClientPool::new(vec![provider.clone()]);
        let source = tree(json!({"enabled": true, "precision": 3, "sizes": [1, "two"]}));

        let outcome = sync_tree(&source, Tree::new(), &mut pool, &LanguagePair::new("en", "fr"))
            .await
            .unwrap();
        assert_eq!(outcome.tree, source);
        assert_eq!(outcome.filled.len(), 3);
        assert!(provider.calls().is_empty());
        assert_eq!(provider.usage_checks(), 0);
    }

    #[test]
    fn unresolvable_paths_are_errors() {
        let source = tree(json!({"a": {"b": "hi"}, "c": null}));
        assert!(source_leaf(&source, &KeyPath::new(["a", "b"]).unwrap()).is_ok());
        for segments in [vec!["a"], vec!["c"], vec!["a", "x"], vec!["z"]] {
            let path = KeyPath::new(segments).unwrap();
            match source_leaf(&source, &path) {
                Err(SyncError::UnresolvedPath(shown)) => assert_eq!(shown, path.to_string()),
                other => panic!("expected UnresolvedPath, got {:?}", other),
            }
        }
    }
}
