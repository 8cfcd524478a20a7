use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "locale-sync",
    version,
    about = "Fill missing localization keys with machine translations"
)]
struct Cli {
    /// Language of the source files (e.g. en)
    #[arg(short = 's', long = "source-language", env = "SOURCE_LANGUAGE")]
    source_language: Option<String>,

    /// Comma separated target languages (e.g. fr,de,pt-BR)
    #[arg(
        short = 't',
        long = "target-languages",
        env = "TARGET_LANGUAGES",
        value_delimiter = ','
    )]
    target_languages: Vec<String>,

    /// Placeholder regex with one capture group (default: %{(.*?)})
    #[arg(short = 'p', long = "variable-pattern", env = "VARIABLE_PATTERN")]
    variable_pattern: Option<String>,

    /// Source files directory, file or glob; `{language}` is replaced
    #[arg(long = "source-dir", env = "SOURCE_FILES_DIRECTORY")]
    source_directory: Option<String>,

    /// Target files directory, file or glob; `{language}` is replaced
    #[arg(long = "target-dir", env = "TARGET_FILES_DIRECTORY")]
    target_directory: Option<String>,

    /// Comma separated API keys
    #[arg(
        short = 'k',
        long = "api-keys",
        env = "API_KEYS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    api_keys: Vec<String>,

    /// File format (yaml, json)
    #[arg(short = 'f', long = "file-type", env = "FILE_TYPE")]
    file_type: Option<String>,

    /// Translation provider (deepl)
    #[arg(short = 'a', long = "api-type", env = "API_TYPE")]
    api_type: Option<String>,

    /// Override the provider base URL (proxies, local servers)
    #[arg(long = "api-base-url", env = "API_BASE_URL")]
    api_base_url: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "settings")]
    settings: Option<String>,

    /// Report missing keys without translating or writing
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

impl Cli {
    fn config(self) -> locale_sync::Config {
        locale_sync::Config {
            source_language: self.source_language,
            target_languages: self.target_languages,
            variable_pattern: self.variable_pattern,
            source_directory: self.source_directory,
            target_directory: self.target_directory,
            api_keys: self.api_keys,
            file_type: self.file_type,
            api_type: self.api_type,
            api_base_url: self.api_base_url,
            settings_path: self.settings,
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    locale_sync::logging::init(cli.verbose)?;
    let report = locale_sync::run(cli.config()).await?;
    for pair in &report.pairs {
        println!("{}", pair);
    }
    Ok(())
}
