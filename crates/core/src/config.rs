use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com/products";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_COURIERS_URL: &str = "https://recruitment.weflapp.com/tarifier";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub backend: BackendConfig,
    pub server: ServerConfig,
    pub couriers: CouriersConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Where the shop session sends quote requests.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct CouriersConfig {
    pub base_url: String,
    pub traelo_ya_api_key: Option<SecretString>,
    pub uder_api_key: Option<SecretString>,
    pub timeout_secs: u64,
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
    pub catalog_url: Option<String>,
    pub backend_url: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
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
            catalog: CatalogConfig { base_url: DEFAULT_CATALOG_URL.to_string(), timeout_secs: 10 },
            backend: BackendConfig { base_url: DEFAULT_BACKEND_URL.to_string(), timeout_secs: 10 },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
            couriers: CouriersConfig {
                base_url: DEFAULT_COURIERS_URL.to_string(),
                traelo_ya_api_key: None,
                uder_api_key: None,
                timeout_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
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
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cartsim.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(base_url) = catalog.base_url {
                self.catalog.base_url = base_url;
            }
            if let Some(timeout_secs) = catalog.timeout_secs {
                self.catalog.timeout_secs = timeout_secs;
            }
        }

        if let Some(backend) = patch.backend {
            if let Some(base_url) = backend.base_url {
                self.backend.base_url = base_url;
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                self.backend.timeout_secs = timeout_secs;
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

        if let Some(couriers) = patch.couriers {
            if let Some(base_url) = couriers.base_url {
                self.couriers.base_url = base_url;
            }
            if let Some(traelo_ya_key_value) = couriers.traelo_ya_api_key {
                self.couriers.traelo_ya_api_key = Some(secret_value(traelo_ya_key_value));
            }
            if let Some(uder_key_value) = couriers.uder_api_key {
                self.couriers.uder_api_key = Some(secret_value(uder_key_value));
            }
            if let Some(timeout_secs) = couriers.timeout_secs {
                self.couriers.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env("CARTSIM_CATALOG_URL") {
            self.catalog.base_url = value;
        }
        if let Some(value) = read_env("CARTSIM_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_secs = parse_u64("CARTSIM_CATALOG_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CARTSIM_BACKEND_URL") {
            self.backend.base_url = value;
        }
        if let Some(value) = read_env("CARTSIM_BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = parse_u64("CARTSIM_BACKEND_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CARTSIM_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CARTSIM_SERVER_PORT") {
            self.server.port = parse_u16("CARTSIM_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("CARTSIM_COURIERS_BASE_URL") {
            self.couriers.base_url = value;
        }
        if let Some(value) = read_env("CARTSIM_TRAELO_YA_API_KEY") {
            self.couriers.traelo_ya_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("CARTSIM_UDER_API_KEY") {
            self.couriers.uder_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("CARTSIM_COURIERS_TIMEOUT_SECS") {
            self.couriers.timeout_secs = parse_u64("CARTSIM_COURIERS_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("CARTSIM_LOGGING_LEVEL").or_else(|| read_env("CARTSIM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CARTSIM_LOGGING_FORMAT").or_else(|| read_env("CARTSIM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_url) = overrides.catalog_url {
            self.catalog.base_url = catalog_url;
        }
        if let Some(backend_url) = overrides.backend_url {
            self.backend.base_url = backend_url;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_backend(&self.backend)?;
        validate_server(&self.server)?;
        validate_couriers(&self.couriers)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// Extra checks for running the quote backend, which must reach the couriers.
    pub fn validate_for_server(&self) -> Result<(), ConfigError> {
        self.validate()?;
        require_secret("couriers.traelo_ya_api_key", self.couriers.traelo_ya_api_key.as_ref())?;
        require_secret("couriers.uder_api_key", self.couriers.uder_api_key.as_ref())?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cartsim.toml"), PathBuf::from("config/cartsim.toml")]
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

fn validate_http_url(key: &str, url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    validate_http_url("catalog.base_url", &catalog.base_url)?;
    validate_timeout("catalog.timeout_secs", catalog.timeout_secs)
}

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    validate_http_url("backend.base_url", &backend.base_url)?;
    validate_timeout("backend.timeout_secs", backend.timeout_secs)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    Ok(())
}

fn validate_couriers(couriers: &CouriersConfig) -> Result<(), ConfigError> {
    validate_http_url("couriers.base_url", &couriers.base_url)?;
    validate_timeout("couriers.timeout_secs", couriers.timeout_secs)
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

fn require_secret(key: &str, secret: Option<&SecretString>) -> Result<(), ConfigError> {
    let missing = secret.map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true);
    if missing {
        return Err(ConfigError::Validation(format!(
            "{key} is required to run the quote server"
        )));
    }
    Ok(())
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
    catalog: Option<EndpointPatch>,
    backend: Option<EndpointPatch>,
    server: Option<ServerPatch>,
    couriers: Option<CouriersPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EndpointPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct CouriersPatch {
    base_url: Option<String>,
    traelo_ya_api_key: Option<String>,
    uder_api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
