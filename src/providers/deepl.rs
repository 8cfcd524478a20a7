use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ProviderFuture, TranslationProvider};
use crate::error::{LanguageRole, SyncError, SyncResult};
use crate::languages::LanguageTable;
use crate::placeholder::{PlaceholderCodec, WRAPPER_TAG};

const FREE_BASE_URL: &str = "https://api-free.deepl.com";
const PREMIUM_BASE_URL: &str = "https://api.deepl.com";
const USAGE_ENDPOINT: &str = "/v2/usage";
const TRANSLATE_ENDPOINT: &str = "/v2/translate";

const SUPPORTED_SOURCE_LANGUAGES: &[&str] = &[
    "AR", "BG", "CS", "DA", "DE", "EL", "EN", "ES", "ET", "FI", "FR", "HU", "ID", "IT", "JA", "KO",
    "LT", "LV", "NB", "NL", "PL", "PT", "RO", "RU", "SK", "SL", "SV", "TR", "UK", "ZH",
];

const SUPPORTED_TARGET_LANGUAGES: &[&str] = &[
    "AR", "BG", "CS", "DA", "DE", "EL", "EN", "EN-GB", "EN-US", "ES", "ET", "FI", "FR", "HU", "ID",
    "IT", "JA", "KO", "LT", "LV", "NB", "NL", "PL", "PT", "PT-BR", "PT-PT", "RO", "RU", "SK", "SL",
    "SV", "TR", "UK", "ZH",
];

/// Service variant a key belongs to, probed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Premium,
}

const TIER_PROBE_ORDER: [Tier; 2] = [Tier::Free, Tier::Premium];

#[derive(Debug, Clone, Default)]
struct QuotaState {
    tier: Option<Tier>,
    remaining: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DeepL {
    key: String,
    codec: PlaceholderCodec,
    client: reqwest::Client,
    free_base_url: String,
    premium_base_url: String,
    state: QuotaState,
    source_languages: LanguageTable,
    target_languages: LanguageTable,
}

impl DeepL {
    pub fn new(key: impl Into<String>, codec: PlaceholderCodec) -> Self {
        Self {
            key: key.into(),
            codec,
            client: reqwest::Client::new(),
            free_base_url: FREE_BASE_URL.to_string(),
            premium_base_url: PREMIUM_BASE_URL.to_string(),
            state: QuotaState::default(),
            source_languages: LanguageTable::new(LanguageRole::Source, SUPPORTED_SOURCE_LANGUAGES),
            target_languages: LanguageTable::new(LanguageRole::Target, SUPPORTED_TARGET_LANGUAGES),
        }
    }

    pub fn with_base_urls(mut self, free: impl Into<String>, premium: impl Into<String>) -> Self {
        self.free_base_url = trim_base(free.into());
        self.premium_base_url = trim_base(premium.into());
        self
    }

    pub fn tier(&self) -> Option<Tier> {
        self.state.tier
    }

    fn url(&self, tier: Tier, endpoint: &str) -> String {
        let base = match tier {
            Tier::Free => &self.free_base_url,
            Tier::Premium => &self.premium_base_url,
        };
        format!("{}{}", base, endpoint)
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.key)
    }

    async fn fetch_usage(&self, tier: Tier) -> SyncResult<u64> {
        let response = self
            .client
            .get(self.url(tier, USAGE_ENDPOINT))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let text = read_success(response).await?;
        let payload: UsageResponse = serde_json::from_str(&text)
            .map_err(|err| SyncError::translation(format!("invalid usage payload: {}", err)))?;
        Ok(payload
            .character_limit
            .saturating_sub(payload.character_count))
    }

    async fn ensure_validated(&mut self) -> SyncResult<Tier> {
        if let Some(tier) = self.state.tier {
            return Ok(tier);
        }
        for tier in TIER_PROBE_ORDER {
            match self.fetch_usage(tier).await {
                Ok(remaining) => {
                    debug!("DeepL key accepted by {:?} tier", tier);
                    self.state.tier = Some(tier);
                    self.state.remaining = Some(remaining);
                    return Ok(tier);
                }
                Err(SyncError::InvalidCredential) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(SyncError::InvalidCredential)
    }

    async fn remaining(&mut self) -> SyncResult<u64> {
        let tier = self.ensure_validated().await?;
        if let Some(remaining) = self.state.remaining {
            return Ok(remaining);
        }
        let remaining = self.fetch_usage(tier).await?;
        self.state.remaining = Some(remaining);
        Ok(remaining)
    }

    async fn translate_one(
        &mut self,
        tier: Tier,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> SyncResult<String> {
        let protected = self.codec.protect(text);
        let characters = protected.chars().count() as u64;
        let remaining = self.remaining().await?;
        if remaining < characters {
            return Err(SyncError::usage(format!(
                "request needs {} characters but only {} remain",
                characters, remaining
            )));
        }

        let body = json!({
            "text": [protected],
            "source_lang": source_lang,
            "target_lang": target_lang,
            "tag_handling": "xml",
            "ignore_tags": [WRAPPER_TAG],
        });
        let response = self
            .client
            .post(self.url(tier, TRANSLATE_ENDPOINT))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        let text = read_success(response).await?;
        let payload: TranslateResponse = serde_json::from_str(&text)
            .map_err(|err| SyncError::translation(format!("invalid translate payload: {}", err)))?;
        let translated = payload
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::translation("no translation returned from DeepL"))?;

        self.state.remaining = Some(remaining - characters);
        Ok(self.codec.restore(&translated.text))
    }
}

impl TranslationProvider for DeepL {
    fn name(&self) -> &str {
        "DeepL"
    }

    fn validate(&mut self) -> ProviderFuture<'_, ()> {
        Box::pin(async move { self.ensure_validated().await.map(|_| ()) })
    }

    fn usage(&mut self) -> ProviderFuture<'_, u64> {
        Box::pin(async move { self.remaining().await })
    }

    fn translate<'a>(
        &'a mut self,
        texts: &'a [String],
        source_language: &'a str,
        target_language: &'a str,
    ) -> ProviderFuture<'a, Vec<String>> {
        Box::pin(async move {
            let tier = self.ensure_validated().await?;
            let source_lang = self.source_languages.resolve(source_language)?;
            let target_lang = self.target_languages.resolve(target_language)?;
            let mut results = Vec::with_capacity(texts.len());
            for text in texts {
                results.push(
                    self.translate_one(tier, text, &source_lang, &target_lang)
                        .await?,
                );
            }
            Ok(results)
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

async fn read_success(response: reqwest::Response) -> SyncResult<String> {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(SyncError::InvalidCredential);
    }
    if !status.is_success() {
        return Err(SyncError::translation(format!(
            "DeepL API error ({}): {}",
            status,
            extract_deepl_error(&text).unwrap_or(text)
        )));
    }
    Ok(text)
}

fn extract_deepl_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.message.filter(|message| !message.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    character_count: u64,
    character_limit: u64,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<TranslationItem>,
}

#[derive(Debug, Deserialize)]
struct TranslationItem {
    text: String,
}
