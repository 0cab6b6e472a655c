//! Tool settings for the plan checker.
//!
//! Settings come from `plancheck.yaml`, found in the working directory or one
//! of its parents, with `PLANCHECK_*` environment variables taking precedence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, PlanCheckError, Result};

/// Settings file names to search for.
pub const DEFAULT_SETTINGS_FILES: &[&str] = &["plancheck.yaml", "plancheck.yml"];

/// Log levels accepted in settings.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Plan checker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Output format.
    pub output: OutputFormat,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Treat references to resources missing from both plan and run as
    /// failures.
    pub fail_on_unresolved: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: OutputFormat::Text,
            log_level: String::from("info"),
            fail_on_unresolved: false,
        }
    }
}

impl Settings {
    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or invalid.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading settings from: {}", path.display());

        if !path.exists() {
            return Err(PlanCheckError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PlanCheckError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        Self::parse_yaml(&content, Some(path))
    }

    /// Parses and validates settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value is out of range.
    pub fn parse_yaml(content: &str, source: Option<&Path>) -> Result<Self> {
        debug!("Parsing YAML settings");

        let settings: Self = serde_yaml::from_str(content).map_err(|e| {
            PlanCheckError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Finds and loads the nearest settings file, falling back to defaults
    /// when there is none. Environment overrides are applied either way.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but is invalid, or an
    /// override has an invalid value.
    pub fn discover(start_dir: impl AsRef<Path>) -> Result<Self> {
        let mut settings = match find_settings_file(start_dir) {
            Some(path) => Self::load_file(path)?,
            None => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        };

        settings.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Applies `PLANCHECK_OUTPUT` and `PLANCHECK_LOG_LEVEL` overrides, read
    /// through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if an override has an invalid value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(output) = lookup("PLANCHECK_OUTPUT") {
            debug!("Overriding output from environment");
            self.output = match output.to_ascii_lowercase().as_str() {
                "text" => OutputFormat::Text,
                "json" => OutputFormat::Json,
                other => {
                    return Err(ConfigError::invalid(
                        "PLANCHECK_OUTPUT",
                        format!("unknown output format '{other}'"),
                    )
                    .into());
                }
            };
        }

        if let Some(level) = lookup("PLANCHECK_LOG_LEVEL") {
            debug!("Overriding log_level from environment");
            self.log_level = level;
        }

        self.validate()
    }

    /// Checks that every setting has an accepted value.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::invalid(
                "log_level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            )
            .into());
        }
        Ok(())
    }
}

/// Finds the settings file in `start_dir` or its parent directories.
#[must_use]
pub fn find_settings_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_SETTINGS_FILES {
            let candidate = current.join(filename);
            if candidate.exists() {
                info!("Found settings file: {}", candidate.display());
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Loads `.env` from `base_dir` if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be loaded.
pub fn load_dotenv(base_dir: impl AsRef<Path>) -> Result<()> {
    let env_path = base_dir.as_ref().join(".env");

    if !env_path.exists() {
        debug!(".env file not found at: {}", env_path.display());
        return Ok(());
    }

    info!("Loading environment from: {}", env_path.display());
    dotenvy::from_path(&env_path).map_err(|e| {
        PlanCheckError::Config(ConfigError::ParseError {
            message: format!("Failed to load .env file: {e}"),
            location: Some(env_path.display().to_string()),
        })
    })
}
