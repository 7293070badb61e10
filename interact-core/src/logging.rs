//! Tracing setup: daily rolling file plus stderr, both `EnvFilter`-filtered.
//!
//! Lines look like `000042 DEBUG [src/callback/store.rs:120 interact_core::callback::store] ...`.

use std::{
    fs,
    path::PathBuf,
    sync::OnceLock,
    sync::atomic::{AtomicUsize, Ordering},
};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use tracing::Metadata;
use tracing_appender::rolling::{RollingFileAppender, daily};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self, FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    prelude::*,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub log_file_prefix: CompactString,
    pub log_level: CompactString,
    pub stderr: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: CompactString::const_new("interact"),
            log_level: CompactString::const_new("info"),
            stderr: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Invalid log level directive '{0}'")]
    InvalidLevel(CompactString),
}

pub struct Logger;

impl Logger {
    /// Call **once** near the start of `main`.
    pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggingError> {
        fs::create_dir_all(&config.log_dir)?;

        SEQ.get_or_init(|| AtomicUsize::new(1));

        // daily rolling file appender → <log_dir>/<prefix>.YYYY-MM-DD
        let file: RollingFileAppender = daily(&config.log_dir, config.log_file_prefix.as_str());

        let file_layer = fmt::layer()
            .event_format(SeqFileMod)
            .with_writer(file)
            .with_ansi(false)
            .with_filter(Self::filter(&config.log_level)?);

        let stderr_layer = if config.stderr {
            Some(
                fmt::layer()
                    .event_format(SeqFileMod)
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_filter(Self::filter(&config.log_level)?),
            )
        } else {
            None
        };

        tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .try_init()
            .map_err(|_| LoggingError::AlreadyInitialized)
    }

    fn filter(level: &str) -> Result<EnvFilter, LoggingError> {
        let directive = level
            .parse()
            .map_err(|_| LoggingError::InvalidLevel(level.into()))?;
        Ok(EnvFilter::from_default_env().add_directive(directive))
    }
}

static SEQ: OnceLock<AtomicUsize> = OnceLock::new();

/// Custom formatter: `[SEQ] LEVEL [file:line mod::path] message`
struct SeqFileMod;

impl<S, N> FormatEvent<S, N> for SeqFileMod
where
    S: tracing::Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut w: Writer<'_>,
        ev: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let seq: usize = SEQ
            .get_or_init(|| AtomicUsize::new(1))
            .fetch_add(1, Ordering::Relaxed);

        let meta: &'static Metadata<'static> = ev.metadata();
        write!(
            w,
            "{seq:06} {:5} [{}:{} {}] ",
            meta.level(),
            meta.file().unwrap_or("??"),
            meta.line().unwrap_or(0),
            meta.module_path().unwrap_or("???"),
        )?;

        ctx.field_format().format_fields(w.by_ref(), ev)?;
        writeln!(w)
    }
}
