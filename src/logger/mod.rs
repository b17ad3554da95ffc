//! Logger built on `tracing-subscriber`.
//!
//! - Console output with color control (ANSI only on a TTY)
//! - Optional file output in full, compact or JSON format
//! - Size-based rotation of the log file
//! - Runtime level changes through [`LogLevelHandle`]

pub mod config;
pub mod error;
pub(crate) mod writer;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, registry::LookupSpan, reload,
    util::SubscriberInitExt,
};
use writer::RotatingFileWriter;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Handle for changing the active filter after the logger is installed.
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: FilterHandle,
}

impl LogLevelHandle {
    /// Replace the filter with a new level or directive string.
    pub fn set_level(&self, level: &str) -> Result<(), LoggerError> {
        let filter = EnvFilter::try_new(level)
            .map_err(|e| LoggerError::config(format!("invalid filter '{level}': {e}")))?;
        self.inner
            .reload(filter)
            .map_err(|e| LoggerError::reload(e.to_string()))
    }

    /// Current filter directives, if the subscriber is still alive.
    pub fn current(&self) -> Option<String> {
        self.inner.with_current(|filter| filter.to_string()).ok()
    }
}

impl std::fmt::Debug for LogLevelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLevelHandle")
            .field("current", &self.current())
            .finish()
    }
}

/// Install the global subscriber described by `config`.
pub fn init_logger(config: LoggerConfig) -> Result<LogLevelHandle, LoggerError> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(filter);

    // File layer goes first so console ANSI settings don't leak into span
    // fields written to the file (tokio-rs/tracing#1817).
    let mut layers = Vec::new();
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(layers)
        .try_init()
        .map_err(|e| LoggerError::config(format!("logger already initialized: {e}")))?;

    Ok(LogLevelHandle { inner: handle })
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

fn console_layer<S>(config: &ConsoleConfig) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer<S>(config: &FileConfig) -> Result<BoxedLayer<S>, LoggerError>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer = RotatingFileWriter::new(config)?;

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    };

    Ok(layer)
}
