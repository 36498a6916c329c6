//! Logger construction options.
//!
//! Options are applied in sequence to a builder; each one is independently settable and
//! unset options keep their defaults:
//!
//! | option            | default         |
//! |-------------------|-----------------|
//! | `level`           | `debug`         |
//! | `environment`     | `"development"` |
//! | identity fields   | `"n/a"`         |
//! | `context_keys`    | none            |
//!
//! ```
//! use context_logger::logging::{ContextKey, ContextKeys, Level, LoggerOptions};
//!
//! static TENANT_KEY: ContextKey = ContextKey::new("tenant");
//!
//! let options = LoggerOptions::default()
//!     .level("info")
//!     .environment("production")
//!     .app("Orders")
//!     .context_keys(ContextKeys::new().with(&TENANT_KEY, "tenant"));
//!
//! assert_eq!(options.level, Level::Info);
//! assert_eq!(options.app, "orders");
//! ```

use crate::config::LoggingConfig;
use crate::logging::context::ContextKeys;
use crate::logging::record::Level;

/// Environment selecting the human-readable renderer.
pub const DEVELOPMENT: &str = "development";

const NOT_AVAILABLE: &str = "n/a";

/// Immutable logger configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub environment: String,
    pub level: Level,
    pub app: String,
    pub version: String,
    pub commit: String,
    pub build_time: String,
    pub runtime_version: String,
    pub context_keys: ContextKeys,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            environment: DEVELOPMENT.to_string(),
            level: Level::Debug,
            app: NOT_AVAILABLE.to_string(),
            version: NOT_AVAILABLE.to_string(),
            commit: NOT_AVAILABLE.to_string(),
            build_time: NOT_AVAILABLE.to_string(),
            runtime_version: NOT_AVAILABLE.to_string(),
            context_keys: ContextKeys::new(),
        }
    }
}

impl LoggerOptions {
    /// Minimum severity. Unknown names fall back to `debug`.
    #[must_use]
    pub fn level(mut self, level: &str) -> Self {
        self.level = Level::parse_or(level, Level::Debug);
        self
    }

    /// `"development"` renders text lines; anything else renders JSON.
    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Application name, stored lowercase.
    #[must_use]
    pub fn app(mut self, app: &str) -> Self {
        self.app = app.to_lowercase();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = commit.into();
        self
    }

    #[must_use]
    pub fn build_time(mut self, build_time: impl Into<String>) -> Self {
        self.build_time = build_time.into();
        self
    }

    #[must_use]
    pub fn runtime_version(mut self, runtime_version: impl Into<String>) -> Self {
        self.runtime_version = runtime_version.into();
        self
    }

    #[must_use]
    pub fn context_keys(mut self, keys: ContextKeys) -> Self {
        self.context_keys = keys;
        self
    }

    /// Whether records are rendered for humans.
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case(DEVELOPMENT)
    }
}

impl From<&LoggingConfig> for LoggerOptions {
    fn from(config: &LoggingConfig) -> Self {
        LoggerOptions::default()
            .level(&config.level)
            .environment(config.environment.clone())
            .app(&config.app)
            .version(config.version.clone())
            .commit(config.commit.clone())
            .build_time(config.build_time.clone())
            .runtime_version(config.runtime_version.clone())
    }
}
