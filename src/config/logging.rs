use crate::config::parameter;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment types for log level configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" | "testing" => Environment::Test,
            _ => Environment::Development,
        }
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// Logging configuration for security-aware logging
#[derive(Debug)]
pub struct LoggingConfig {
    environment: Environment,
    log_level: Level,
}

impl LoggingConfig {
    /// Initialize logging configuration from the loaded parameters
    pub fn init() -> Self {
        let environment = parameter::get_optional("ENV")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Environment::Development);

        let log_level = parameter::get_optional("LOG_LEVEL")
            .and_then(|level| parse_level(&level))
            .unwrap_or(Level::INFO);

        Self {
            environment,
            log_level,
        }
    }

    /// Check if detailed error logging is allowed
    pub fn allow_detailed_errors(&self) -> bool {
        matches!(self.environment, Environment::Development) || self.log_level >= Level::DEBUG
    }

    /// Check if sensitive data logging is allowed
    pub fn allow_sensitive_data(&self) -> bool {
        matches!(self.environment, Environment::Development) && self.log_level >= Level::DEBUG
    }
}

/// Global logging configuration instance
static LOGGING_CONFIG: std::sync::OnceLock<LoggingConfig> = std::sync::OnceLock::new();

/// Install the tracing subscriber before any parameter is loaded, so the
/// level comes straight from `RUST_LOG` or `LOG_LEVEL` in the environment.
pub fn init_subscriber() {
    // `.env` values never override the process environment, so loading it
    // again in `parameter::init` is harmless
    dotenv::dotenv().ok();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::warn!("Tracing subscriber already installed");
    }
}

/// Initialize global logging configuration
pub fn init() {
    let config = LoggingConfig::init();
    tracing::info!(
        "Logging configured: environment={:?}, level={:?}",
        config.environment,
        config.log_level
    );

    if LOGGING_CONFIG.set(config).is_err() {
        tracing::warn!("Logging configuration already initialized, skipping re-initialization");
    }
}

/// Get global logging configuration, falling back to defaults when `init`
/// has not run (unit tests).
pub fn get_config() -> &'static LoggingConfig {
    LOGGING_CONFIG.get_or_init(LoggingConfig::init)
}

/// Security-aware logging macros
pub mod secure_log {

    /// Log errors with environment-aware detail level
    macro_rules! secure_error {
        ($message:expr) => {
            if $crate::config::logging::get_config().allow_detailed_errors() {
                tracing::error!("{}", $message);
            } else {
                tracing::error!("An internal error occurred");
            }
        };
        ($message:expr, $error:expr) => {
            if $crate::config::logging::get_config().allow_detailed_errors() {
                tracing::error!("{}: {}", $message, $error);
            } else {
                tracing::error!("{}: An internal error occurred", $message);
            }
        };
        ($($arg:tt)*) => {
            if $crate::config::logging::get_config().allow_detailed_errors() {
                tracing::error!($($arg)*);
            } else {
                tracing::error!("An internal error occurred");
            }
        };
    }

    /// Log sensitive data only in development with debug level
    macro_rules! sensitive_debug {
        ($($arg:tt)*) => {
            if $crate::config::logging::get_config().allow_sensitive_data() {
                tracing::debug!($($arg)*);
            }
        };
    }

    pub(crate) use secure_error;
    pub(crate) use sensitive_debug;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse("testing"), Environment::Test);
        assert_eq!(Environment::parse("unknown"), Environment::Development);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_development_defaults() {
        let config = LoggingConfig {
            environment: Environment::Development,
            log_level: Level::INFO,
        };

        assert!(config.allow_detailed_errors());
        assert!(!config.allow_sensitive_data());
    }

    #[test]
    fn test_subscriber_installs_before_parameters() {
        init_subscriber();
        init_subscriber();

        assert!(tracing::dispatcher::has_been_set());
    }

    #[test]
    fn test_production_restrictions() {
        let config = LoggingConfig {
            environment: Environment::Production,
            log_level: Level::INFO,
        };

        assert!(!config.allow_detailed_errors());
        assert!(!config.allow_sensitive_data());
    }
}
