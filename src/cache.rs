use std::collections::HashMap;

use tracing::info;

use crate::error::{SyncError, SyncResult};
use crate::pool::ClientPool;
use crate::providers::TranslationProvider;
use crate::tree::Value;

/// Translations already computed during one (source tree, target language)
/// pass, keyed by the exact source text.
#[derive(Debug, Default)]
pub struct TranslationCache {
    map: HashMap<String, String>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.map.get(text).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the cached translation of `text`, asking the best provider of
    /// `pool` on a miss.
    pub async fn translate<P: TranslationProvider>(
        &mut self,
        text: &str,
        pool: &mut ClientPool<P>,
        languages: &LanguagePair<'_>,
    ) -> SyncResult<String> {
        if let Some(existing) = self.map.get(text) {
            return Ok(existing.clone());
        }
        info!(
            "{} Translating '{}' from '{}' to '{}'",
            languages.label, text, languages.source, languages.target
        );
        let texts = [text.to_string()];
        let translated = pool
            .best()
            .await?
            .translate(&texts, languages.source, languages.target)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::translation("provider returned no translation"))?;
        self.map.insert(text.to_string(), translated.clone());
        Ok(translated)
    }

    /// Translates a leaf. Sequences are translated element by element through
    /// the same cache.
    pub async fn resolve<P: TranslationProvider>(
        &mut self,
        value: &Value,
        pool: &mut ClientPool<P>,
        languages: &LanguagePair<'_>,
    ) -> SyncResult<Value> {
        match value {
            Value::Text(text) => Ok(Value::Text(self.translate(text, pool, languages).await?)),
            Value::List(items) => {
                let mut translated = Vec::with_capacity(items.len());
                for item in items {
                    translated.push(self.translate(item, pool, languages).await?);
                }
                Ok(Value::List(translated))
            }
            other => Ok(other.clone()),
        }
    }
}

/// Languages of one pass plus the log prefix naming it.
#[derive(Debug, Clone)]
pub struct LanguagePair<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub label: String,
}

impl<'a> LanguagePair<'a> {
    pub fn new(source: &'a str, target: &'a str) -> Self {
        Self {
            source,
            target,
            label: format!("[{}]", target),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ScriptedProvider;

    #[tokio::test]
    async fn repeated_text_hits_the_provider_once() {
        let provider = ScriptedProvider::new("p", 1000);
        let mut pool = ClientPool::new(vec![provider.clone()]);
        let mut cache = TranslationCache::new();
        let languages = LanguagePair::new("en", "fr");

        let first = cache.translate("Hello", &mut pool, &languages).await.unwrap();
        let second = cache.translate("Hello", &mut pool, &languages).await.unwrap();
        assert_eq!(first, "fr:Hello");
        assert_eq!(first, second);
        assert_eq!(provider.calls(), vec!["Hello".to_string()]);
        assert_eq!(cache.get("Hello"), Some("fr:Hello"));
    }

    #[tokio::test]
    async fn sequences_share_the_cache_with_strings() {
        let provider = ScriptedProvider::new("p", 1000);
        let mut pool = ClientPool::new(vec![provider.clone()]);
        let mut cache = TranslationCache::new();
        let languages = LanguagePair::new("en", "de");

        let list = Value::list(["Yes", "No", "Yes"]);
        let resolved = cache.resolve(&list, &mut pool, &languages).await.unwrap();
        assert_eq!(resolved, Value::list(["de:Yes", "de:No", "de:Yes"]));

        let single = cache
            .resolve(&Value::text("No"), &mut pool, &languages)
            .await
            .unwrap();
        assert_eq!(single, Value::text("de:No"));
        assert_eq!(provider.calls(), vec!["Yes".to_string(), "No".to_string()]);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn provider_errors_are_not_cached() {
        let provider = ScriptedProvider::new("p", 1000).failing("boom");
        let mut pool = ClientPool::new(vec![provider]);
        let mut cache = TranslationCache::new();
        let languages = LanguagePair::new("en", "fr");
        assert!(matches!(
            cache.translate("Hello", &mut pool, &languages).await,
            Err(SyncError::Translation(_))
        ));
        assert!(cache.is_empty());
    }
}
