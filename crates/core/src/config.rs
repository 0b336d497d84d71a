use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bookings: BookingsConfig,
    pub fx: FxConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BookingsConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout_secs: u64,
}

/// Both `base_url` and `api_key` must be present for non-identity conversions.
#[derive(Clone, Debug)]
pub struct FxConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

/// An API key switches the interpreter to model-assisted parsing.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bookings_base_url: Option<String>,
    pub bookings_api_key: Option<String>,
    pub fx_base_url: Option<String>,
    pub fx_api_key: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bookings: BookingsConfig {
                base_url: "https://api.san.turneo.co".to_string(),
                api_key: String::new().into(),
                timeout_secs: 10,
            },
            fx: FxConfig { base_url: None, api_key: None, timeout_secs: 10 },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.openai.com".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FxConfig {
    pub fn is_configured(&self) -> bool {
        let has_url = self.base_url.as_deref().is_some_and(|url| !url.trim().is_empty());
        let has_key =
            self.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty());
        has_url && has_key
    }
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty())
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let config = Self::load_layers(options)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves only the `[llm]` section. Booking credentials may be absent.
    pub fn load_llm(options: LoadOptions) -> Result<LlmConfig, ConfigError> {
        let config = Self::load_layers(options)?;
        validate_llm(&config.llm)?;
        validate_logging(&config.logging)?;
        Ok(config.llm)
    }

    fn load_layers(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(bookings) = patch.bookings {
            if let Some(base_url) = bookings.base_url {
                self.bookings.base_url = base_url;
            }
            if let Some(api_key) = bookings.api_key {
                self.bookings.api_key = secret_value(api_key);
            }
            if let Some(timeout_secs) = bookings.timeout_secs {
                self.bookings.timeout_secs = timeout_secs;
            }
        }

        if let Some(fx) = patch.fx {
            if let Some(base_url) = fx.base_url {
                self.fx.base_url = Some(base_url);
            }
            if let Some(api_key) = fx.api_key {
                self.fx.api_key = Some(secret_value(api_key));
            }
            if let Some(timeout_secs) = fx.timeout_secs {
                self.fx.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BOOKSUM_BOOKINGS_BASE_URL") {
            self.bookings.base_url = value;
        }
        if let Some(value) = read_env("BOOKSUM_BOOKINGS_API_KEY") {
            self.bookings.api_key = secret_value(value);
        }
        if let Some(value) = read_env("BOOKSUM_BOOKINGS_TIMEOUT_SECS") {
            self.bookings.timeout_secs = parse_u64("BOOKSUM_BOOKINGS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BOOKSUM_FX_BASE_URL") {
            self.fx.base_url = Some(value);
        }
        if let Some(value) = read_env("BOOKSUM_FX_API_KEY") {
            self.fx.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("BOOKSUM_FX_TIMEOUT_SECS") {
            self.fx.timeout_secs = parse_u64("BOOKSUM_FX_TIMEOUT_SECS", &value)?;
        }

        let llm_api_key = read_env("BOOKSUM_LLM_API_KEY").or_else(|| read_env("OPENAI_API_KEY"));
        if let Some(value) = llm_api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("BOOKSUM_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        let llm_model = read_env("BOOKSUM_LLM_MODEL").or_else(|| read_env("OPENAI_MODEL"));
        if let Some(value) = llm_model {
            self.llm.model = value;
        }
        if let Some(value) = read_env("BOOKSUM_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("BOOKSUM_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BOOKSUM_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BOOKSUM_SERVER_PORT") {
            self.server.port = parse_u16("BOOKSUM_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("BOOKSUM_LOGGING_LEVEL").or_else(|| read_env("BOOKSUM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BOOKSUM_LOGGING_FORMAT").or_else(|| read_env("BOOKSUM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.bookings_base_url {
            self.bookings.base_url = base_url;
        }
        if let Some(api_key) = overrides.bookings_api_key {
            self.bookings.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.fx_base_url {
            self.fx.base_url = Some(base_url);
        }
        if let Some(api_key) = overrides.fx_api_key {
            self.fx.api_key = Some(secret_value(api_key));
        }
        if let Some(api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(api_key));
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bookings(&self.bookings)?;
        validate_fx(&self.fx)?;
        validate_llm(&self.llm)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("booksum.toml"), PathBuf::from("config/booksum.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }
    Err(ConfigError::Validation(format!("{field} must start with http:// or https://")))
}

fn validate_timeout(field: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{field} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_bookings(bookings: &BookingsConfig) -> Result<(), ConfigError> {
    validate_http_url("bookings.base_url", bookings.base_url.trim())?;
    validate_timeout("bookings.timeout_secs", bookings.timeout_secs)?;

    if bookings.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "bookings.api_key is required (set BOOKSUM_BOOKINGS_API_KEY or [bookings].api_key)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_fx(fx: &FxConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &fx.base_url {
        validate_http_url("fx.base_url", base_url.trim())?;
    }
    validate_timeout("fx.timeout_secs", fx.timeout_secs)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    validate_timeout("llm.timeout_secs", llm.timeout_secs)?;
    if llm.is_enabled() {
        validate_http_url("llm.base_url", llm.base_url.trim())?;
        if llm.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "llm.model is required when llm.api_key is set".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    bookings: Option<BookingsPatch>,
    fx: Option<FxPatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingsPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FxPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
