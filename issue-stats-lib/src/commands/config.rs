use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, app_err};
use serde::Deserialize;
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Configuration file looked up in the current directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "issue-stats.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQLite database holding packages, tokens, and statistics
    #[serde(default = "default_database")]
    pub database: Utf8PathBuf,

    /// Root of the GitHub REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Repository host accepted when resolving package repository URLs
    #[serde(default = "default_supported_host")]
    pub supported_host: String,

    /// Provider name used to look up developer tokens
    #[serde(default = "default_credential_provider")]
    pub credential_provider: String,

    /// Issues requested per page (1..=100)
    #[serde(default = "default_page_size")]
    pub page_size: u8,

    /// Pages fetched per repository before giving up
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Timeout for each HTTP request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Longest wait for a rate limit to reset
    #[serde(default = "default_max_rate_limit_wait", with = "humantime_serde")]
    pub max_rate_limit_wait: Duration,

    /// Exit with a non-zero status when any package fails
    #[serde(default)]
    pub fail_on_error: bool,
}

fn default_database() -> Utf8PathBuf {
    Utf8PathBuf::from("issue-stats.db")
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_supported_host() -> String {
    "github.com".to_string()
}

fn default_credential_provider() -> String {
    "Github".to_string()
}

const fn default_page_size() -> u8 {
    100
}

const fn default_max_pages() -> u32 {
    100
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

const fn default_max_rate_limit_wait() -> Duration {
    Duration::from_secs(15 * 60)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// An explicitly requested file must exist. Without one, `issue-stats.toml` in the
    /// current directory is used if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading issue-stats configuration file '{path}'"))?;
            (path.to_path_buf(), text)
        } else {
            let path = Utf8PathBuf::from(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // No config file found, use defaults
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading issue-stats configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate().map_err(|e| e.enrich_with(|| format!("validating configuration file '{final_path}'")))?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or malformed
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.page_size) {
            return Err(app_err!("page_size must be between 1 and 100, got {}", self.page_size));
        }

        if self.max_pages == 0 {
            return Err(app_err!("max_pages must be at least 1"));
        }

        if self.supported_host.trim().is_empty() {
            return Err(app_err!("supported_host must not be empty"));
        }

        let _ = Url::parse(&self.api_base_url).into_app_err_with(|| format!("api_base_url '{}' is not a valid URL", self.api_base_url))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
