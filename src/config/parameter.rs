use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{error, info, warn};

static CONFIG: OnceLock<HashMap<String, String>> = OnceLock::new();

/// Default configuration values
const DEFAULTS: &[(&str, &str)] = &[
    ("SERVER_ADDRESS", "127.0.0.1"),
    ("SERVER_PORT", "8081"),
    ("ENV", "development"),
    ("LOG_LEVEL", "info"),
    ("STORAGE_BACKEND", "postgres"),
    ("DB_MAX_CONNECTIONS", "20"),
    ("DB_MIN_CONNECTIONS", "5"),
    ("DB_ACQUIRE_TIMEOUT_SECONDS", "30"),
    ("JWT_ACCESS_TTL_IN_MINUTES", "15"),
    ("JWT_REFRESH_TTL_IN_DAYS", "7"),
    ("BCRYPT_COST", "10"),
    ("AUTH_RATE_LIMIT_REQUESTS", "10"),
    ("AUTH_RATE_LIMIT_WINDOW_SECONDS", "15"),
    ("RATE_LIMIT_CLEANUP_INTERVAL_SECONDS", "60"),
];

/// Keys with no default. They are read from the environment when present
/// and left absent otherwise, so callers decide whether absence is fatal.
const REQUIRED: &[&str] = &["DATABASE_URL", "JWT_ACCESS_SECRET", "JWT_REFRESH_SECRET"];

pub fn init() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment file: {:?}", path),
        Err(_) => warn!("No .env file found, using system environment variables"),
    }

    if CONFIG.set(load(|key| std::env::var(key).ok())).is_err() {
        error!("Configuration already initialized");
    } else {
        info!("Configuration initialized successfully");
    }
}

/// Builds the parameter map from defaults overridden by `lookup`.
fn load(lookup: impl Fn(&str) -> Option<String>) -> HashMap<String, String> {
    let mut config = HashMap::new();

    for (key, value) in DEFAULTS {
        config.insert(key.to_string(), value.to_string());
    }

    let keys = DEFAULTS.iter().map(|(key, _)| *key).chain(REQUIRED.iter().copied());
    for key in keys {
        if let Some(value) = lookup(key) {
            config.insert(key.to_string(), value);
        }
    }

    config
}

pub fn get(parameter: &str) -> String {
    get_optional(parameter).unwrap_or_else(|| {
        error!("Configuration parameter '{}' not found", parameter);
        panic!("Required configuration parameter '{}' is missing", parameter);
    })
}

pub fn get_optional(parameter: &str) -> Option<String> {
    CONFIG
        .get()
        .and_then(|config| config.get(parameter))
        .cloned()
}

pub fn get_i64(parameter: &str) -> i64 {
    let value = get(parameter);
    value.parse::<i64>().unwrap_or_else(|_| {
        error!("Configuration parameter '{}' is not a valid i64: {}", parameter, value);
        panic!("Configuration parameter '{}' is not a valid i64", parameter);
    })
}

pub fn get_u64(parameter: &str) -> u64 {
    let value = get(parameter);
    value.parse::<u64>().unwrap_or_else(|_| {
        error!("Configuration parameter '{}' is not a valid u64: {}", parameter, value);
        panic!("Configuration parameter '{}' is not a valid u64", parameter);
    })
}

pub fn get_u32(parameter: &str) -> u32 {
    let value = get(parameter);
    value.parse::<u32>().unwrap_or_else(|_| {
        error!("Configuration parameter '{}' is not a valid u32: {}", parameter, value);
        panic!("Configuration parameter '{}' is not a valid u32", parameter);
    })
}

/// Number of loaded parameters (reported by the health endpoint)
pub fn loaded_count() -> usize {
    CONFIG.get().map(HashMap::len).unwrap_or(0)
}
