use std::future::Future;
use std::pin::Pin;

use crate::error::{SyncError, SyncResult};
use crate::placeholder::PlaceholderCodec;

mod deepl;

pub use deepl::{DeepL, Tier};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = SyncResult<T>> + Send + 'a>>;

/// A credentialed translation endpoint with a character quota.
///
/// `usage` must be cheap after the first call: implementations fetch the
/// remaining quota once and afterwards only decrement it locally when a
/// translation succeeds.
pub trait TranslationProvider: Send {
    fn name(&self) -> &str;

    /// Probes the service tiers until one accepts the credential.
    fn validate(&mut self) -> ProviderFuture<'_, ()>;

    /// Remaining character quota.
    fn usage(&mut self) -> ProviderFuture<'_, u64>;

    /// Translates each text with its own request; output order matches input.
    fn translate<'a>(
        &'a mut self,
        texts: &'a [String],
        source_language: &'a str,
        target_language: &'a str,
    ) -> ProviderFuture<'a, Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    DeepL,
}

impl ProviderKind {
    pub fn from_name(name: &str) -> SyncResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "deepl" => Ok(ProviderKind::DeepL),
            _ => Err(SyncError::UnsupportedProvider(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DeepL => "deepl",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProviderImpl {
    DeepL(DeepL),
}

impl TranslationProvider for ProviderImpl {
    fn name(&self) -> &str {
        match self {
            ProviderImpl::DeepL(provider) => provider.name(),
        }
    }

    fn validate(&mut self) -> ProviderFuture<'_, ()> {
        match self {
            ProviderImpl::DeepL(provider) => provider.validate(),
        }
    }

    fn usage(&mut self) -> ProviderFuture<'_, u64> {
        match self {
            ProviderImpl::DeepL(provider) => provider.usage(),
        }
    }

    fn translate<'a>(
        &'a mut self,
        texts: &'a [String],
        source_language: &'a str,
        target_language: &'a str,
    ) -> ProviderFuture<'a, Vec<String>> {
        match self {
            ProviderImpl::DeepL(provider) => {
                provider.translate(texts, source_language, target_language)
            }
        }
    }
}

/// Connection overrides shared by every provider built for one run.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Replaces every tier's base URL, e.g. for a local proxy.
    pub base_url: Option<String>,
}

pub fn build_provider(
    kind: ProviderKind,
    key: String,
    codec: PlaceholderCodec,
    options: &ProviderOptions,
) -> ProviderImpl {
    match kind {
        ProviderKind::DeepL => {
            let mut provider = DeepL::new(key, codec);
            if let Some(base) = options.base_url.as_deref() {
                provider = provider.with_base_urls(base, base);
            }
            ProviderImpl::DeepL(provider)
        }
    }
}

/// One provider per distinct, non-blank credential, in the given order.
pub fn build_providers(
    kind: ProviderKind,
    keys: &[String],
    codec: &PlaceholderCodec,
    options: &ProviderOptions,
) -> Vec<ProviderImpl> {
    let mut seen: Vec<&str> = Vec::new();
    let mut providers = Vec::new();
    for key in keys {
        let key = key.trim();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        providers.push(build_provider(kind, key.to_string(), codec.clone(), options));
    }
    providers
}
