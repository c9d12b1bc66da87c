use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::http::{RetryConfig, TimeoutSettings};
use crate::platform::{PlatformContext, ReportFile};
use crate::telemetry::LogFormat;

/// Environment variable holding the platform API key; never read from the config file
pub const API_KEY_ENV: &str = "RS_API_KEY";
/// Prefix for environment overrides of config file values
pub const ENV_PREFIX: &str = "RS_UPLOAD";

/// Configuration file as written by the operator
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploaderConfig {
    /// Platform base URL, e.g. https://platform.risksense.com
    #[serde(default)]
    pub platform_url: String,
    /// Client the API key acts on behalf of
    #[serde(default)]
    pub client_id: String,
    /// Directory containing the report
    #[serde(default)]
    pub folder: String,
    /// Exact name of the target network
    #[serde(default)]
    pub network_name: String,
    /// Report file name inside `folder`
    #[serde(default)]
    pub csv_filename: String,
    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Filled from the environment at load time
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeouts(&self) -> TimeoutSettings {
        TimeoutSettings {
            connect: self.connect_timeout_secs.map(Duration::from_secs),
            request: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("could not read configuration file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("missing required configuration values: {}", missing.join(", "))]
    MissingValues { missing: Vec<&'static str> },

    #[error("report file {} does not exist", path.display())]
    ReportMissing { path: PathBuf },
}

impl ConfigError {
    pub fn quick_fixes(&self) -> Vec<String> {
        match self {
            ConfigError::NotFound { path } => vec![
                format!("Create {} from the sample in conf/config.toml", path.display()),
                "Or point to another file: --config <path>".to_string(),
            ],
            ConfigError::Unreadable { .. } => vec!["Check the file is valid TOML".to_string()],
            ConfigError::MissingValues { missing } => missing
                .iter()
                .map(|name| {
                    if *name == API_KEY_ENV {
                        format!("export {API_KEY_ENV}=<your api key>")
                    } else {
                        format!("Set '{name}' in the config file")
                    }
                })
                .collect(),
            ConfigError::ReportMissing { .. } => vec![
                "Check 'folder' and 'csv_filename' in the config file".to_string(),
                "Run the dependency scan export before this job".to_string(),
            ],
        }
    }
}

/// Validated, immutable inputs for one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub context: PlatformContext,
    pub network_name: String,
    pub report: ReportFile,
    pub retry: RetryConfig,
    pub timeouts: TimeoutSettings,
}

impl UploaderConfig {
    /// Default location: `conf/config.toml` next to the executable, falling back to the
    /// working directory.
    pub fn default_path() -> PathBuf {
        let relative = Path::new("conf").join("config.toml");
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(&relative)))
            .filter(|candidate| candidate.exists())
            .unwrap_or(relative)
    }

    /// Load the TOML file, apply `RS_UPLOAD_*` overrides and pick up the API key from
    /// `RS_API_KEY`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let unreadable = |source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(unreadable)?;

        let mut uploader_config: UploaderConfig = config.try_deserialize().map_err(unreadable)?;
        uploader_config.api_key = std::env::var(API_KEY_ENV).ok();
        Ok(uploader_config)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> anyhow::Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// Names of required values that are absent or blank
    pub fn missing_values(&self) -> Vec<&'static str> {
        let required = [
            ("platform_url", self.platform_url.as_str()),
            ("client_id", self.client_id.as_str()),
            ("folder", self.folder.as_str()),
            ("network_name", self.network_name.as_str()),
            ("csv_filename", self.csv_filename.as_str()),
            (API_KEY_ENV, self.api_key.as_deref().unwrap_or_default()),
        ];

        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// Check every required value is present and the report exists.
    ///
    /// Any gap is a hard failure: no partially configured run ever reaches the network.
    pub fn validate(&self) -> Result<RunSettings, ConfigError> {
        let missing = self.missing_values();
        if !missing.is_empty() {
            return Err(ConfigError::MissingValues { missing });
        }

        let report = ReportFile::new(self.folder.trim(), self.csv_filename.trim());
        if !report.path().is_file() {
            return Err(ConfigError::ReportMissing { path: report.path() });
        }

        Ok(RunSettings {
            context: PlatformContext::new(
                &self.platform_url,
                &self.client_id,
                self.api_key.as_deref().unwrap_or_default(),
            ),
            network_name: self.network_name.trim().to_string(),
            report,
            retry: self.retry.clone(),
            timeouts: self.http.timeouts(),
        })
    }

    /// TOML rendering for display, with the API key left out
    pub fn to_redacted_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
