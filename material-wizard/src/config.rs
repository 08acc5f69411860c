// Runtime configuration
//
// Layering (later wins): built-in defaults -> TOML file -> environment.
// Environment keys use `MATERIAL_WIZARD__<SECTION>__<KEY>`, e.g. `MATERIAL_WIZARD__API__BASE_URL`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "MATERIAL_WIZARD";
const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "material-wizard";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub wizard: WizardSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Origin of the backend; `/api/...` paths are joined onto it.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Optional bearer token sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
            auth_token: None,
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    /// Roles whose users start directly in retroactive mode instead of seeing the chooser.
    pub retroactive_roles: Vec<String>,
    /// Prefix used when formatting money on the review page.
    pub currency_symbol: String,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            retroactive_roles: vec!["site_engineer".to_string(), "supervisor".to_string()],
            currency_symbol: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `error` | `warn` | `info` | `debug` | `trace`
    pub level: String,
    /// Log folder override. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            dir: None,
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" | "warning" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Debug,
        }
    }
}

/// Default config file location: `<config_dir>/material-wizard/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load settings. An explicit path must exist; the default path is optional.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    load_with_env(explicit, None)
}

/// `load` with the environment layer read from `env` instead of the process environment
/// when given.
fn load_with_env(
    explicit: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<Settings> {
    let mut builder = config::Config::builder();

    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!("Config file not found: {:?}", path));
            }
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("wizard.retroactive_roles")
            .try_parsing(true)
            .source(env),
    );

    let settings = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize::<Settings>()
        .context("Invalid configuration")?;

    Ok(settings)
}

/// Effective settings as TOML (for `--print-config`). The auth token is masked.
pub fn to_toml(settings: &Settings) -> Result<String> {
    let mut redacted = settings.clone();
    if let Some(token) = redacted.api.auth_token.as_deref() {
        redacted.api.auth_token = Some(crate::utils::logging::mask_sensitive(token));
    }
    toml::to_string_pretty(&redacted).context("Failed to render configuration as TOML")
}
