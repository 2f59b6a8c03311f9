//! Configuration loading and environment parsing.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::validation::validate_config_security;
use super::Config;

/// Load configuration with the following precedence (highest first):
/// 1) Named environment variable overrides: `PORT`, `MAX_CONNECTIONS_PER_IP`,
///    `CONNECTION_RATE_LIMIT`, `ADMIN_PASSWORD`, `LOG_FORMAT`.
/// 2) `config.json` at the path named by `CONFIG_PATH`, or `config.json` in
///    the current working directory if `CONFIG_PATH` is unset.
/// 3) Defaults compiled into the binary.
///
/// `RUST_LOG` is not merged here; it is consulted directly by
/// [`crate::logging::init_with_config`] as a fallback when `logging.level`
/// is unset, so it already wins without going through this layering.
///
/// Any errors while reading/parsing are printed to stderr and defaults are used.
///
/// **Note:** Validation errors from [`validate_config_security`] are logged to stderr but are
/// *not* propagated — `load()` always returns a `Config`. Callers who need hard failure
/// should call [`validate_config_security()`](super::validation::validate_config_security)
/// on the returned config and handle the error themselves.
#[must_use]
pub fn load() -> Config {
    use std::env;

    let defaults = Config::default();
    let mut merged =
        serde_json::to_value(&defaults).unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

    let config_path = env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    merge_file_source(&mut merged, &config_path);

    apply_named_env_overrides(&mut merged);

    let config = match serde_json::from_value::<Config>(merged) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to deserialize config; using defaults: {e}");
            defaults
        }
    };

    // Security validation for sensitive fields — intentional warn-only behaviour;
    // main.rs calls validate_config_security() again and propagates errors properly.
    if let Err(e) = validate_config_security(&config) {
        eprintln!("Configuration validation error: {e}");
    }

    config
}

fn merge_file_source(target: &mut Value, path: &Path) {
    if path.as_os_str().is_empty() || !path.exists() {
        return;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Value>(&contents) {
            Ok(value) => merge_values(target, value),
            Err(err) => eprintln!("Failed to parse config from {}: {err}", path.display()),
        },
        Err(err) => eprintln!("Failed to read config from {}: {err}", path.display()),
    }
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target_slot, source_value) => {
            *target_slot = source_value;
        }
    }
}

/// Apply the fixed set of environment variable overrides this service
/// recognizes, layered on top of file configuration so they always win.
fn apply_named_env_overrides(root: &mut Value) {
    use std::env;

    if let Ok(raw) = env::var("PORT") {
        set_number(root, &["port"], &raw);
    }
    if let Ok(raw) = env::var("MAX_CONNECTIONS_PER_IP") {
        set_number(root, &["server", "max_connections_per_ip"], &raw);
    }
    if let Ok(raw) = env::var("CONNECTION_RATE_LIMIT") {
        set_number(root, &["server", "max_connections_per_window"], &raw);
    }
    if let Ok(raw) = env::var("ADMIN_PASSWORD") {
        set_string(root, &["admin_password"], raw);
    }
    if let Ok(raw) = env::var("LOG_FORMAT") {
        set_string(root, &["logging", "format"], raw.to_ascii_lowercase());
    }
}

fn set_number(root: &mut Value, path: &[&str], raw: &str) {
    let Ok(parsed) = raw.trim().parse::<i64>() else {
        eprintln!("Invalid numeric value for {}: {raw}", path.join("."));
        return;
    };
    set_at_path(root, path, Value::from(parsed));
}

fn set_string(root: &mut Value, path: &[&str], raw: String) {
    set_at_path(root, path, Value::String(raw));
}

fn set_at_path(root: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut cursor = root;
    for segment in parents {
        let map = ensure_object(cursor);
        cursor = map
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    let map = ensure_object(cursor);
    map.insert((*last).to_string(), value);
}

fn ensure_object(value: &mut Value) -> &mut serde_json::Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(serde_json::Map::new());
    }

    // SAFETY: The branch above guarantees `value` is a `Value::Object`, so
    // `as_object_mut()` will always return `Some`.
    #[allow(clippy::expect_used)]
    value
        .as_object_mut()
        .expect("value should be coerced into an object")
}
