//! Tracing subscriber setup shared by chirp binaries.

use serde::Serialize;
use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" | "plain" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

/// How to initialize logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive (a level or `target=level` list).
    pub level: String,
    pub format: LogFormat,
    /// Write to stderr instead of stdout.
    pub stderr: bool,
}

impl LogConfig {
    /// Pretty output on stdout at `level`.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            stderr: false,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Keeps the non-blocking writer flushing; hold for the life of the process.
#[must_use = "dropping the guards stops log output"]
pub struct LoggingGuards {
    _writer: WorkerGuard,
}

impl fmt::Debug for LoggingGuards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingGuards").finish_non_exhaustive()
    }
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<LoggingGuards> {
    let filter = EnvFilter::try_new(&config.level)?;

    let (writer, guard, ansi) = if config.stderr {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
        (writer, guard, std::io::stderr().is_terminal())
    } else {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        (writer, guard, std::io::stdout().is_terminal())
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_fmt::layer()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_target(false),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_current_span(false),
            )
            .try_init()?,
    }

    Ok(LoggingGuards { _writer: guard })
}
