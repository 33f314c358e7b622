//! Error types for SPR Core
//!
//! Registration failures never surface as `Err`: they are reported to the
//! diagnostics sink and counted in the pass report. The errors here cover the
//! engine's own setup and session bookkeeping.

use spr_accumulator::ChannelId;
use spr_model::ModelError;
use std::path::PathBuf;

/// Configuration loading or validation failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`EngineConfig`](crate::EngineConfig)
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// A layout directory is not a valid resource path
    #[error("invalid layout.{field}: {source}")]
    InvalidLayout {
        /// Offending field
        field: &'static str,
        /// Validation failure
        #[source]
        source: ModelError,
    },
}

/// Build session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Channel was never opened, or was already finalized and released
    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),
}
