//! Category loggers backed by `tracing`
//!
//! A single [`Logging`] provider is created at process start and handed to the
//! components that need it. Each component asks it for a [`Logger`] by
//! category name; loggers are created lazily and shared afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Log levels understood by [`Logger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        write!(f, "{}", s)
    }
}

/// Provider of per-category loggers
#[derive(Clone)]
pub struct Logging {
    debug: bool,
    loggers: Arc<Mutex<HashMap<String, Logger>>>,
}

impl Logging {
    /// Create a provider; debug output is only produced when `debug` is set
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            loggers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a provider that enables debug output when `DEBUG` is set in the environment
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("DEBUG").is_some())
    }

    /// Get (or lazily create) the logger for a category
    pub fn logger(&self, category: &str) -> Logger {
        let mut loggers = match self.loggers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        loggers
            .entry(category.to_string())
            .or_insert_with(|| Logger::new(category, self.debug))
            .clone()
    }

    /// Number of categories created so far
    pub fn categories(&self) -> usize {
        self.loggers.lock().map(|l| l.len()).unwrap_or_default()
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Leveled logger for one category
#[derive(Clone)]
pub struct Logger {
    category: Arc<str>,
    debug: bool,
}

impl Logger {
    fn new(category: &str, debug: bool) -> Self {
        Self {
            category: Arc::from(category),
            debug,
        }
    }

    /// The category this logger reports under
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Whether messages at `level` would be emitted
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Error => tracing::enabled!(tracing::Level::ERROR),
            LogLevel::Warn => tracing::enabled!(tracing::Level::WARN),
            LogLevel::Info => tracing::enabled!(tracing::Level::INFO),
            LogLevel::Debug => self.debug && tracing::enabled!(tracing::Level::DEBUG),
        }
    }

    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(category = %self.category, "{}", message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(category = %self.category, "{}", message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(category = %self.category, "{}", message);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        if self.debug {
            tracing::debug!(category = %self.category, "{}", message);
        }
    }

    /// Log every non-blank line of multi-line output at `level`
    pub fn lines(&self, level: LogLevel, output: &str) {
        let content = output.trim();
        if content.is_empty() {
            return;
        }
        for line in content.lines() {
            match level {
                LogLevel::Error => self.error(line),
                LogLevel::Warn => self.warn(line),
                LogLevel::Info => self.info(line),
                LogLevel::Debug => self.debug(line),
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("category", &self.category)
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loggers_are_created_once_per_category() {
        let logging = Logging::new(false);
        let a = logging.logger("kubernetes");
        let b = logging.logger("kubernetes");
        let c = logging.logger("apply");

        assert_eq!(a.category(), "kubernetes");
        assert_eq!(b.category(), "kubernetes");
        assert_eq!(c.category(), "apply");
        assert_eq!(logging.categories(), 2);
    }

    #[test]
    fn test_debug_disabled_without_flag() {
        let logging = Logging::new(false);
        assert!(!logging.logger("wait").is_enabled(LogLevel::Debug));
    }

    #[test]
    fn test_clones_share_registry() {
        let logging = Logging::new(true);
        let cloned = logging.clone();
        cloned.logger("get");
        assert_eq!(logging.categories(), 1);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert!(LogLevel::Error < LogLevel::Debug);
    }
}
