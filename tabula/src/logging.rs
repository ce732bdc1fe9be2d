//! Logging configuration.
//!
//! The library only emits `tracing` events. [`LogConfig`] decides which of the
//! chattier events (generated SQL, per-table progress) are emitted at all; the
//! [`setup`] module installs a subscriber for binaries.

use serde::{Deserialize, Serialize};

/// Which optional diagnostics the engine emits.
///
/// Loadable as the `log` key of a JSON engine configuration; missing fields
/// keep their [`LogConfig::balanced`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log every generated SQL statement at debug level
    pub log_queries: bool,
    /// Log each table as the summary aggregation finishes it
    pub log_table_progress: bool,
    /// Logged SQL longer than this many characters is clipped
    pub max_sql_chars: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::balanced()
    }
}

impl LogConfig {
    /// Everything on, SQL kept almost whole.
    pub fn verbose() -> Self {
        Self {
            log_queries: true,
            log_table_progress: true,
            max_sql_chars: 2048,
        }
    }

    /// No optional events.
    pub fn production() -> Self {
        Self {
            log_queries: false,
            log_table_progress: false,
            ..Self::balanced()
        }
    }

    /// Table progress without SQL.
    pub fn balanced() -> Self {
        Self {
            log_queries: false,
            log_table_progress: true,
            max_sql_chars: 256,
        }
    }
}

/// Logs a generated SQL statement when `log_queries` is set.
#[macro_export]
macro_rules! log_query {
    ($config:expr, $sql:expr) => {
        if $config.log_queries {
            tracing::debug!(
                sql = %$crate::logging::clip_sql($sql, $config.max_sql_chars),
                "executing query"
            );
        }
    };
}

/// Logs per-table progress when `log_table_progress` is set.
#[macro_export]
macro_rules! log_table_progress {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_table_progress {
            tracing::debug!($($arg)*);
        }
    };
}

/// Collapses whitespace runs in `sql` to single spaces and clips the result to
/// `max_chars` characters.
pub fn clip_sql(sql: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(sql.len().min(max_chars + 1));
    let mut taken = 0;
    for word in sql.split_whitespace() {
        if taken > 0 {
            if taken == max_chars {
                out.push('…');
                return out;
            }
            out.push(' ');
            taken += 1;
        }
        for c in word.chars() {
            if taken == max_chars {
                out.push('…');
                return out;
            }
            out.push(c);
            taken += 1;
        }
    }
    out
}

/// Subscriber installation for binaries.
pub mod setup {
    use tracing::Level;

    /// Options for the subscriber installed by [`init_logging`].
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Level for events outside this crate
        pub level: Level,
        /// Level for `tabula` events
        pub tabula_level: Level,
        /// One JSON object per line instead of human-readable text
        pub json_format: bool,
        /// Extra `EnvFilter` directives appended to the level directives
        pub directives: Vec<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self::for_verbosity(false)
        }
    }

    impl LoggingConfig {
        /// Warnings only, or debug output for `tabula` when `verbose`.
        pub fn for_verbosity(verbose: bool) -> Self {
            Self {
                level: Level::WARN,
                tabula_level: if verbose { Level::DEBUG } else { Level::INFO },
                json_format: false,
                directives: Vec::new(),
            }
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Adds an `EnvFilter` directive such as `rusqlite=trace`.
        pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
            self.directives.push(directive.into());
            self
        }

        /// The filter used when `RUST_LOG` is unset.
        pub fn env_filter(&self) -> String {
            let mut filter = format!(
                "{},tabula={}",
                self.level.as_str().to_lowercase(),
                self.tabula_level.as_str().to_lowercase()
            );
            for directive in &self.directives {
                filter.push(',');
                filter.push_str(directive);
            }
            filter
        }
    }

    /// Installs a global subscriber writing to stderr. `RUST_LOG` overrides the
    /// configured filter.
    ///
    /// ```rust,no_run
    /// use tabula::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::for_verbosity(true).with_json_format(true))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.env_filter()))?;

        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let layer = if config.json_format {
            layer.json().boxed()
        } else {
            layer.boxed()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(LogConfig::default(), LogConfig::balanced());
        assert!(LogConfig::verbose().log_queries);
        let production = LogConfig::production();
        assert!(!production.log_queries);
        assert!(!production.log_table_progress);
        assert_eq!(production.max_sql_chars, 256);
    }

    #[test]
    fn test_clip_sql_collapses_whitespace() {
        let sql = "SELECT *\n    FROM \"t\"\n    WHERE x = ?1";
        assert_eq!(clip_sql(sql, 100), "SELECT * FROM \"t\" WHERE x = ?1");
        assert_eq!(clip_sql(sql, 8), "SELECT *…");
        assert_eq!(clip_sql("Ámbito", 2), "Ám…");
    }

    #[test]
    fn test_env_filter() {
        assert_eq!(LoggingConfig::default().env_filter(), "warn,tabula=info");
        assert_eq!(
            LoggingConfig::for_verbosity(true)
                .with_directive("rusqlite=trace")
                .env_filter(),
            "warn,tabula=debug,rusqlite=trace"
        );
    }
}
