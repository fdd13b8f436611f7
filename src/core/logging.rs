//! Diagnostic logging to stderr or a log file.
//!
//! Level, format and destination come from CLI flags first, then the
//! `ULTIMA_LOG`, `ULTIMA_LOG_FORMAT` and `ULTIMA_LOG_FILE` environment
//! variables. `RUST_LOG` replaces the computed filter entirely.

use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "ULTIMA_LOG";
pub const LOG_FORMAT_ENV: &str = "ULTIMA_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "ULTIMA_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
    /// Compact logs (single line, terse).
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Log level from CLI argument.
///
/// Defaults to `Warn` so failed capability probes are visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from CLI argument.
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "critical" | "crit" => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert to tracing filter string.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Logging settings after merging flags and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Merge CLI values with the process environment.
    #[must_use]
    pub fn resolve(
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
        verbose: bool,
    ) -> Self {
        Self::resolve_with(cli_level, cli_format, verbose, |key| std::env::var(key).ok())
    }

    /// Merge CLI values with an injected environment lookup.
    ///
    /// `-v` raises the default level to debug but never overrides an
    /// explicit level.
    #[must_use]
    pub fn resolve_with(
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
        verbose: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let non_empty = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let level = cli_level
            .or_else(|| non_empty(LOG_LEVEL_ENV).and_then(|v| LogLevel::from_arg(&v)))
            .unwrap_or(if verbose { LogLevel::Debug } else { LogLevel::Warn });
        let format = cli_format
            .or_else(|| non_empty(LOG_FORMAT_ENV).and_then(|v| LogFormat::from_arg(&v)))
            .unwrap_or_default();
        let file = non_empty(LOG_FILE_ENV).map(PathBuf::from);

        Self {
            level,
            format,
            file,
        }
    }
}

/// Initialize the global subscriber. Later calls are no-ops.
pub fn init(settings: &LogSettings) {
    let file = settings.file.as_ref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    let make_writer = |file: Option<&std::fs::File>| -> BoxMakeWriter {
        if let Some(file) = file.and_then(|inner| inner.try_clone().ok()) {
            BoxMakeWriter::new(file)
        } else {
            BoxMakeWriter::new(std::io::stderr)
        }
    };

    let level = settings.level;
    let make_filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("ultima={}", level.as_filter())))
    };

    match settings.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .json()
                .with_writer(make_writer(file.as_ref()))
                .with_span_events(FmtSpan::CLOSE)
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .compact()
                .with_writer(make_writer(file.as_ref()))
                .with_target(true)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .with_writer(make_writer(file.as_ref()))
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn level_parsing_accepts_aliases() {
        assert_eq!(LogLevel::from_arg("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_arg("verbose"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_arg("crit"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_arg("loud"), None);
    }

    #[test]
    fn defaults_to_warn_human_stderr() {
        let settings = LogSettings::resolve_with(None, None, false, env_of(&[]));
        assert_eq!(settings, LogSettings::default());
        assert_eq!(settings.level, LogLevel::Warn);
    }

    #[test]
    fn env_fills_in_missing_flags() {
        let settings = LogSettings::resolve_with(
            None,
            Some(LogFormat::Compact),
            false,
            env_of(&[
                (LOG_LEVEL_ENV, "trace"),
                (LOG_FORMAT_ENV, "json"),
                (LOG_FILE_ENV, "/tmp/ultima.log"),
            ]),
        );
        assert_eq!(settings.level, LogLevel::Trace);
        assert_eq!(settings.format, LogFormat::Compact);
        assert_eq!(settings.file, Some(PathBuf::from("/tmp/ultima.log")));
    }

    #[test]
    fn verbose_only_raises_the_default() {
        let settings = LogSettings::resolve_with(None, None, true, env_of(&[]));
        assert_eq!(settings.level, LogLevel::Debug);

        let settings = LogSettings::resolve_with(Some(LogLevel::Error), None, true, env_of(&[]));
        assert_eq!(settings.level, LogLevel::Error);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let settings =
            LogSettings::resolve_with(None, None, false, env_of(&[(LOG_FILE_ENV, "  ")]));
        assert_eq!(settings.file, None);
    }
}
