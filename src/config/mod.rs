//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::render::DEFAULT_MAX_ROWS;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "taskdeck";
const DEFAULT_STAGING_DIR: &str = "taskdeck";
const DEFAULT_DEMO_X: u32 = 10;

/// Command-line arguments for the taskdeck binary.
#[derive(Debug, Parser)]
#[command(
    name = "taskdeck",
    version,
    about = "Render task decks into browsable HTML bundles"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TASKDECK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the bundled demo tasks and materialize their decks.
    Demo(DemoArgs),
    /// Build one deck per input file and materialize them as a single task.
    Build(BuildArgs),
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub overrides: DeckOverrides,

    /// Number of points plotted by the scatter task.
    #[arg(long, default_value_t = DEFAULT_DEMO_X)]
    pub x: u32,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            overrides: DeckOverrides::default(),
            x: DEFAULT_DEMO_X,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub overrides: DeckOverrides,

    /// Task name recorded in the deck index.
    #[arg(long, default_value = "build")]
    pub task: String,

    /// Markdown, JSON, or source files; each becomes one deck.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath, required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DeckOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the directory under which deck bundles are staged.
    #[arg(long = "staging-root", value_name = "PATH")]
    pub staging_root: Option<PathBuf>,

    /// Override the maximum number of table rows rendered per frame.
    #[arg(long = "frame-max-rows", value_name = "COUNT")]
    pub frame_max_rows: Option<usize>,

    /// Copy finished bundles under this directory.
    #[arg(long = "publish-root", value_name = "PATH")]
    pub publish_root: Option<PathBuf>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub deck: DeckSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DeckSettings {
    pub staging_root: PathBuf,
    pub frame_max_rows: usize,
    pub publish_root: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("TASKDECK").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Demo(args)) => raw.apply_deck_overrides(&args.overrides),
        Some(Command::Build(args)) => raw.apply_deck_overrides(&args.overrides),
        None => raw.apply_deck_overrides(&DeckOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    deck: RawDeckSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDeckSettings {
    staging_root: Option<PathBuf>,
    frame_max_rows: Option<usize>,
    publish_root: Option<PathBuf>,
}

impl RawSettings {
    fn apply_deck_overrides(&mut self, overrides: &DeckOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(root) = overrides.staging_root.as_ref() {
            self.deck.staging_root = Some(root.clone());
        }
        if let Some(rows) = overrides.frame_max_rows {
            self.deck.frame_max_rows = Some(rows);
        }
        if let Some(root) = overrides.publish_root.as_ref() {
            self.deck.publish_root = Some(root.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, deck } = raw;

        let logging = build_logging_settings(logging)?;
        let deck = build_deck_settings(deck)?;

        Ok(Self { logging, deck })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_deck_settings(deck: RawDeckSettings) -> Result<DeckSettings, LoadError> {
    let staging_root = deck
        .staging_root
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_STAGING_DIR));
    if staging_root.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "deck.staging_root",
            "path must not be empty",
        ));
    }

    let frame_max_rows = deck.frame_max_rows.unwrap_or(DEFAULT_MAX_ROWS);
    if frame_max_rows == 0 {
        return Err(LoadError::invalid(
            "deck.frame_max_rows",
            "must be greater than zero",
        ));
    }

    let publish_root = deck
        .publish_root
        .filter(|path| !path.as_os_str().is_empty());

    Ok(DeckSettings {
        staging_root,
        frame_max_rows,
        publish_root,
    })
}

#[cfg(test)]
mod tests;
