use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "locale-sync.toml";
pub const LOCAL_SETTINGS_FILE: &str = "locale-sync.local.toml";

/// Values collected from settings files. Every field is optional; command
/// line and environment values take precedence over all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub source_language: Option<String>,
    pub target_languages: Vec<String>,
    pub variable_pattern: Option<String>,
    pub source_directory: Option<String>,
    pub target_directory: Option<String>,
    pub file_type: Option<String>,
    pub api_type: Option<String>,
    pub api_keys: Vec<String>,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    languages: Option<LanguageSettings>,
    files: Option<FileSettings>,
    provider: Option<ProviderSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LanguageSettings {
    source: Option<String>,
    targets: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    source_directory: Option<String>,
    target_directory: Option<String>,
    #[serde(rename = "type")]
    file_type: Option<String>,
    variable_pattern: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderSettings {
    #[serde(rename = "type")]
    api_type: Option<String>,
    keys: Option<Vec<String>>,
    base_url: Option<String>,
}

/// Loads `locale-sync.toml` and `locale-sync.local.toml` from the working
/// directory, then `extra_path`, each overriding the previous ones.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    load_settings_in(Path::new("."), extra_path)
}

pub fn load_settings_in(base: &Path, extra_path: Option<&Path>) -> Result<Settings> {
    let mut ordered_paths: Vec<PathBuf> =
        vec![base.join(SETTINGS_FILE), base.join(LOCAL_SETTINGS_FILE)];

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    let mut settings = Settings::default();
    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(languages) = incoming.languages {
            merge_text(&mut self.source_language, languages.source);
            merge_list(&mut self.target_languages, languages.targets);
        }
        if let Some(files) = incoming.files {
            merge_text(&mut self.source_directory, files.source_directory);
            merge_text(&mut self.target_directory, files.target_directory);
            merge_text(&mut self.file_type, files.file_type);
            merge_text(&mut self.variable_pattern, files.variable_pattern);
        }
        if let Some(provider) = incoming.provider {
            merge_text(&mut self.api_type, provider.api_type);
            merge_list(&mut self.api_keys, provider.keys);
            merge_text(&mut self.api_base_url, provider.base_url);
        }
    }
}

fn merge_text(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            *slot = Some(value);
        }
    }
}

fn merge_list(slot: &mut Vec<String>, values: Option<Vec<String>>) {
    if let Some(values) = values {
        if !values.is_empty() {
            *slot = values;
        }
    }
}
