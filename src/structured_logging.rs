//! Structured logging support using the `tracing` crate.
//!
//! This module provides integration with the `tracing` ecosystem for
//! structured, context-aware logging of optimizer activity, e.g. learning
//! rates, gradient norms and selection decisions recorded by a training loop.
//!
//! It is only available when the `structured-logging` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! sharpmin = { version = "0.1", features = ["structured-logging"] }
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use sharpmin::structured_logging::{LogFormat, TracingLogger};
//!
//! let _logger = TracingLogger::builder()
//!     .with_format(LogFormat::Json)
//!     .build()
//!     .expect("Failed to initialize logger");
//!
//! tracing::info!(optimizer = "SAM", rho = 0.05, "optimizer selected");
//! tracing::debug!(grad_norm = 0.93, "first step");
//! ```

use crate::{OptimError, OptimResult};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (for development).
    Pretty,
    /// Compact format without colors (for production).
    Compact,
    /// JSON format (for machine parsing and log aggregation).
    Json,
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Show all logs (trace level).
    Trace,
    /// Show debug and higher.
    Debug,
    /// Show info and higher (default for production).
    Info,
    /// Show warnings and errors only.
    Warn,
    /// Show only errors.
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for structured logging.
#[derive(Debug, Clone)]
pub struct TracingLoggerBuilder {
    format: LogFormat,
    level: LogLevel,
    env_filter: Option<String>,
    with_targets: bool,
    with_file_location: bool,
}

impl Default for TracingLoggerBuilder {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: LogLevel::Info,
            env_filter: None,
            with_targets: true,
            with_file_location: false,
        }
    }
}

impl TracingLoggerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log level filter.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set a custom environment filter (overrides level setting).
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Include target names in logs (module paths).
    pub fn with_targets(mut self, enabled: bool) -> Self {
        self.with_targets = enabled;
        self
    }

    /// Include file locations (file:line) in logs.
    pub fn with_file_location(mut self, enabled: bool) -> Self {
        self.with_file_location = enabled;
        self
    }

    /// Build and initialize the logger.
    ///
    /// This must be called only once per application; subsequent calls
    /// return an error.
    pub fn build(self) -> OptimResult<TracingLogger> {
        let env_filter = if let Some(custom_filter) = self.env_filter {
            EnvFilter::try_new(custom_filter)
                .map_err(|e| OptimError::Other(format!("Invalid env filter: {}", e)))?
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
        };

        match self.format {
            LogFormat::Pretty => {
                let layer = fmt::layer()
                    .with_target(self.with_targets)
                    .with_file(self.with_file_location)
                    .with_line_number(self.with_file_location)
                    .with_span_events(FmtSpan::NONE)
                    .pretty();

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .try_init()
                    .map_err(|e| {
                        OptimError::Other(format!("Failed to initialize tracing: {}", e))
                    })?;
            }
            LogFormat::Compact => {
                let layer = fmt::layer()
                    .with_target(self.with_targets)
                    .with_file(self.with_file_location)
                    .with_line_number(self.with_file_location)
                    .with_span_events(FmtSpan::NONE)
                    .with_ansi(false)
                    .compact();

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .try_init()
                    .map_err(|e| {
                        OptimError::Other(format!("Failed to initialize tracing: {}", e))
                    })?;
            }
            LogFormat::Json => {
                let layer = fmt::layer()
                    .with_target(self.with_targets)
                    .with_file(self.with_file_location)
                    .with_line_number(self.with_file_location)
                    .with_span_events(FmtSpan::NONE)
                    .json();

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer)
                    .try_init()
                    .map_err(|e| {
                        OptimError::Other(format!("Failed to initialize tracing: {}", e))
                    })?;
            }
        }

        Ok(TracingLogger {
            _format: self.format,
        })
    }
}

/// Structured logger using the `tracing` ecosystem.
#[derive(Debug)]
pub struct TracingLogger {
    _format: LogFormat,
}

impl TracingLogger {
    /// Create a new logger builder.
    pub fn builder() -> TracingLoggerBuilder {
        TracingLoggerBuilder::new()
    }

    /// Initialize with default settings (pretty format, info level).
    pub fn init() -> OptimResult<Self> {
        Self::builder().build()
    }
}
