use anyhow::{Context, Result, anyhow, bail};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod cache;
pub mod diff;
pub mod error;
pub mod formats;
pub mod languages;
pub mod logging;
pub mod merge;
pub mod placeholder;
pub mod pool;
pub mod providers;
pub mod settings;
pub mod sync;
pub mod tree;

#[cfg(test)]
mod test_util;

pub use cache::{LanguagePair, TranslationCache};
pub use error::{LanguageRole, SyncError, SyncResult};
pub use formats::FileFormat;
pub use placeholder::PlaceholderCodec;
pub use pool::ClientPool;
pub use providers::{ProviderKind, ProviderOptions, TranslationProvider};
pub use sync::{SyncOutcome, sync_tree};
pub use tree::{KeyPath, Tree, Value};

use crate::diff::diff;
use crate::settings::Settings;

/// Token replaced by a language code in directory templates.
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";
pub const DEFAULT_FILE_TYPE: &str = "yaml";
pub const DEFAULT_API_TYPE: &str = "deepl";

/// Command line / environment values. Unset fields fall back to the
/// settings files, then to the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub source_language: Option<String>,
    pub target_languages: Vec<String>,
    pub variable_pattern: Option<String>,
    pub source_directory: Option<String>,
    pub target_directory: Option<String>,
    pub api_keys: Vec<String>,
    pub file_type: Option<String>,
    pub api_type: Option<String>,
    pub api_base_url: Option<String>,
    pub settings_path: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReport {
    pub source_file: PathBuf,
    pub target_file: PathBuf,
    pub language: String,
    pub filled: Vec<KeyPath>,
    /// False for dry runs.
    pub written: bool,
}

impl fmt::Display for PairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]: {} ",
            self.source_file.display(),
            self.target_file.display(),
            self.language,
            self.filled.len()
        )?;
        if self.written {
            f.write_str("filled")
        } else {
            f.write_str("missing (dry run)")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub pairs: Vec<PairReport>,
}

impl RunReport {
    pub fn filled_total(&self) -> usize {
        self.pairs.iter().map(|pair| pair.filled.len()).sum()
    }
}

/// Everything a run needs, after merging the command line over settings.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunPlan {
    source_language: String,
    target_languages: Vec<String>,
    variable_pattern: String,
    source_directory: String,
    target_directory: String,
    api_keys: Vec<String>,
    file_type: String,
    api_type: String,
    api_base_url: Option<String>,
    dry_run: bool,
}

impl RunPlan {
    fn resolve(config: Config, settings: Settings) -> Result<Self> {
        let source_language = pick(config.source_language, settings.source_language)
            .ok_or_else(|| anyhow!("source language is not configured"))?;
        let target_languages = clean_list(pick_list(
            config.target_languages,
            settings.target_languages,
        ));
        if target_languages.is_empty() {
            bail!("target languages are not configured");
        }
        let source_directory = pick(config.source_directory, settings.source_directory)
            .ok_or_else(|| anyhow!("source files directory is not configured"))?;
        let target_directory = pick(config.target_directory, settings.target_directory)
            .ok_or_else(|| anyhow!("target files directory is not configured"))?;
        let api_keys = clean_list(pick_list(config.api_keys, settings.api_keys));
        if api_keys.is_empty() && !config.dry_run {
            bail!("no API keys configured");
        }
        let variable_pattern = pick(config.variable_pattern, settings.variable_pattern)
            .unwrap_or_else(|| placeholder::DEFAULT_PATTERN.to_string());
        let file_type = pick(config.file_type, settings.file_type)
            .unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string());
        let api_type =
            pick(config.api_type, settings.api_type).unwrap_or_else(|| DEFAULT_API_TYPE.to_string());

        Ok(Self {
            source_language,
            target_languages,
            variable_pattern,
            source_directory,
            target_directory,
            api_keys,
            file_type,
            api_type,
            api_base_url: pick(config.api_base_url, settings.api_base_url),
            dry_run: config.dry_run,
        })
    }
}

fn pick(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .filter(|value| !value.trim().is_empty())
        .or(fallback)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn pick_list(primary: Vec<String>, fallback: Vec<String>) -> Vec<String> {
    if primary.iter().any(|value| !value.trim().is_empty()) {
        primary
    } else {
        fallback
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Loads the settings files and synchronizes every source file with every
/// target language.
pub async fn run(config: Config) -> Result<RunReport> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    run_with_settings(config, settings).await
}

pub async fn run_with_settings(config: Config, settings: Settings) -> Result<RunReport> {
    let plan = RunPlan::resolve(config, settings)?;
    let codec = PlaceholderCodec::new(&plan.variable_pattern)?;
    let format = FileFormat::from_name(&plan.file_type)?;
    let kind = ProviderKind::from_name(&plan.api_type)?;
    let options = ProviderOptions {
        base_url: plan.api_base_url.clone(),
    };
    let providers = providers::build_providers(kind, &plan.api_keys, &codec, &options);
    let mut pool = ClientPool::new(providers);
    execute(&plan, format, &mut pool).await
}

async fn execute<P: TranslationProvider>(
    plan: &RunPlan,
    format: FileFormat,
    pool: &mut ClientPool<P>,
) -> Result<RunReport> {
    let source_root = expand_language(&plan.source_directory, &plan.source_language);
    let source_files = format
        .files_matching_path(&source_root)
        .with_context(|| format!("failed to list source files in '{}'", source_root))?;
    if source_files.is_empty() {
        warn!("no {} files found for '{}'", format.as_str(), source_root);
    }

    let mut report = RunReport::default();
    for source_file in source_files {
        let source_tree = format
            .read(&source_file)
            .with_context(|| format!("failed to read source file {}", source_file.display()))?;
        for target_language in &plan.target_languages {
            let target_root = expand_language(&plan.target_directory, target_language);
            let target_file = target_path_for(&source_file, &source_root, &target_root)?;
            let label = format!("[{} - {}]", source_file.display(), target_language);
            info!(
                "{} Translating file '{}' to '{}'",
                label,
                source_file.display(),
                target_language
            );
            let languages =
                LanguagePair::new(&plan.source_language, target_language).with_label(label);
            let filled = if plan.dry_run {
                report_missing(format, &source_tree, &target_file, &languages)?
            } else {
                sync_file(format, pool, &source_tree, &target_file, &languages)
                    .await
                    .with_context(|| format!("{} synchronization failed", languages.label))?
            };
            report.pairs.push(PairReport {
                source_file: source_file.clone(),
                target_file,
                language: target_language.clone(),
                filled,
                written: !plan.dry_run,
            });
        }
    }
    Ok(report)
}

async fn sync_file<P: TranslationProvider>(
    format: FileFormat,
    pool: &mut ClientPool<P>,
    source_tree: &Tree,
    target_file: &Path,
    languages: &LanguagePair<'_>,
) -> SyncResult<Vec<KeyPath>> {
    if !formats::file_exists(target_file) {
        format.touch(target_file)?;
    }
    let target_tree = format.read(target_file)?;
    let outcome = sync_tree(source_tree, target_tree, pool, languages).await?;
    info!(
        "{} Writing translations to '{}'",
        languages.label,
        target_file.display()
    );
    format.write(target_file, &outcome.tree)?;
    Ok(outcome.filled)
}

fn report_missing(
    format: FileFormat,
    source_tree: &Tree,
    target_file: &Path,
    languages: &LanguagePair<'_>,
) -> SyncResult<Vec<KeyPath>> {
    let target_tree = if formats::file_exists(target_file) {
        format.read(target_file)?
    } else {
        Tree::new()
    };
    let missing = diff(source_tree, &target_tree);
    info!(
        "{} Missing keys: [{}]",
        languages.label,
        missing
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(missing)
}

pub fn expand_language(template: &str, language: &str) -> String {
    template.replace(LANGUAGE_PLACEHOLDER, language)
}

/// Maps a source file onto the target tree by swapping the expanded source
/// root for the expanded target root. Glob roots are compared by their
/// literal directory part.
fn target_path_for(source_file: &Path, source_root: &str, target_root: &str) -> Result<PathBuf> {
    let target = if let Ok(rest) = source_file.strip_prefix(source_root) {
        if rest.as_os_str().is_empty() {
            PathBuf::from(target_root)
        } else {
            Path::new(target_root).join(rest)
        }
    } else {
        let source_base = formats::literal_root(source_root);
        let rest = below_root(source_file, &source_base).ok_or_else(|| {
            anyhow!(
                "{} is not below the source directory '{}'",
                source_file.display(),
                source_root
            )
        })?;
        let target_base = formats::literal_root(target_root);
        if target_base == Path::new(".") && !target_root.starts_with("./") {
            rest.to_path_buf()
        } else {
            target_base.join(rest)
        }
    };
    if target == source_file {
        bail!(
            "target file for {} is the source file itself; check the '{}' token in the directory templates",
            source_file.display(),
            LANGUAGE_PLACEHOLDER
        );
    }
    Ok(target)
}

/// `path` relative to `root`; bare relative paths count as below `.`.
fn below_root<'a>(path: &'a Path, root: &Path) -> Option<&'a Path> {
    path.strip_prefix(root)
        .ok()
        .or_else(|| (root == Path::new(".") && path.is_relative()).then_some(path))
}
