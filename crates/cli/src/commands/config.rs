use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cartsim_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct ConfigRow {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    run_with(LoadOptions::default())
}

/// Renders the effective configuration; file attribution follows the same
/// file lookup as `AppConfig::load`.
pub fn run_with(options: LoadOptions) -> String {
    let config_file_path = options.config_path.clone().or_else(detect_config_path);
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];

    for row in rows(&config) {
        let source =
            field_source(&row, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", row.key, row.value));
    }

    lines.join("\n")
}

fn row(key: &'static str, env_keys: &'static [&'static str], value: String) -> ConfigRow {
    ConfigRow { key, env_keys, value }
}

fn rows(config: &AppConfig) -> Vec<ConfigRow> {
    vec![
        row("catalog.base_url", &["CARTSIM_CATALOG_URL"], config.catalog.base_url.clone()),
        row(
            "catalog.timeout_secs",
            &["CARTSIM_CATALOG_TIMEOUT_SECS"],
            config.catalog.timeout_secs.to_string(),
        ),
        row("backend.base_url", &["CARTSIM_BACKEND_URL"], config.backend.base_url.clone()),
        row(
            "backend.timeout_secs",
            &["CARTSIM_BACKEND_TIMEOUT_SECS"],
            config.backend.timeout_secs.to_string(),
        ),
        row(
            "server.bind_address",
            &["CARTSIM_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        row("server.port", &["CARTSIM_SERVER_PORT"], config.server.port.to_string()),
        row(
            "couriers.base_url",
            &["CARTSIM_COURIERS_BASE_URL"],
            config.couriers.base_url.clone(),
        ),
        row(
            "couriers.traelo_ya_api_key",
            &["CARTSIM_TRAELO_YA_API_KEY"],
            redact_secret(config.couriers.traelo_ya_api_key.as_ref()),
        ),
        row(
            "couriers.uder_api_key",
            &["CARTSIM_UDER_API_KEY"],
            redact_secret(config.couriers.uder_api_key.as_ref()),
        ),
        row(
            "couriers.timeout_secs",
            &["CARTSIM_COURIERS_TIMEOUT_SECS"],
            config.couriers.timeout_secs.to_string(),
        ),
        row(
            "logging.level",
            &["CARTSIM_LOGGING_LEVEL", "CARTSIM_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        row(
            "logging.format",
            &["CARTSIM_LOGGING_FORMAT", "CARTSIM_LOG_FORMAT"],
            config.logging.format.as_str().to_string(),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("cartsim.toml"), PathBuf::from("config/cartsim.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    row: &ConfigRow,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_key = row
        .env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, row.key) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret.map(|value| value.expose_secret().trim().len()) {
        None => "<unset>".to_string(),
        Some(0) => "<empty>".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}
