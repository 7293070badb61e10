//! src/error.rs
//! ============================================================================
//! # `CoreError`: Unified Error Type for the interaction core
//!
//! Routing outcomes such as an expired callback are not errors; they are
//! reported through `DispatchOutcome`. This enum covers failures that cross
//! an API boundary: id encoding, handler bodies, argument conversion, the
//! component-disable side effect and configuration I/O.

use std::{io, path::PathBuf};

use compact_str::CompactString;
use thiserror::Error;

use component_id::IdError;

/// Convenient alias carrying the unified error type
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Wire identifier could not be produced (length limit, bad identity).
    #[error("Component ID error: {0}")]
    Id(#[from] IdError),

    /// A builder was finished without enough information.
    #[error("Invalid component: {0}")]
    InvalidComponent(CompactString),

    /// A handler or callback body returned an error or panicked.
    #[error("Handler {handler} failed: {reason}")]
    HandlerFailed {
        handler: CompactString,
        reason: String,
    },

    /// Extracted component data could not be converted to the declared type.
    #[error("Cannot convert '{value}' to {target}")]
    Conversion {
        value: CompactString,
        target: &'static str,
    },

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// TOML config serialization error.
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config file I/O error with path.
    #[error("Failed to access config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Platform config directory could not be determined.
    #[error("Could not determine config directory")]
    ConfigDir,
}

impl CoreError {
    /// Create a handler failure error
    pub fn handler_failed<S1: Into<CompactString>, S2: Into<String>>(
        handler: S1,
        reason: S2,
    ) -> Self {
        Self::HandlerFailed {
            handler: handler.into(),
            reason: reason.into(),
        }
    }

    /// Create a config I/O error
    pub fn config_io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }
}

/// Failure of the host-supplied "disable components at location" call.
///
/// Only ever logged by the callback store; never surfaced to a dispatch.
#[derive(Debug, Error)]
pub enum DisableError {
    #[error("Message {0} not found")]
    MessageNotFound(u64),

    #[error("Disable request failed: {0}")]
    Request(#[from] anyhow::Error),
}
