//! Error types shared by every extension set
//!
//! Native frameworks report failures as an integer `OSStatus` (zero means
//! success). Those codes are kept as-is in [`OsStatus`] and wrapped into the
//! unified [`Error`] enum, so callers can always get back the original code
//! with [`Error::status`].

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::applescript::ScriptError;
use crate::audio::types::PropertyId;

/// Raw status code returned by a native call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OsStatus(pub i32);

impl OsStatus {
    pub const NO_ERR: Self = Self(0);
    /// Generic "bad parameter" error (`paramErr`)
    pub const PARAM_ERR: Self = Self(-50);
    /// File not found (`fnfErr`)
    pub const FILE_NOT_FOUND: Self = Self(-43);
    /// Generic script failure (`errOSAScriptError`)
    pub const OSA_SCRIPT_ERROR: Self = Self(-2740);

    // kExtAudioFileError_*
    pub const INVALID_PROPERTY: Self = Self(-66561);
    pub const INVALID_PROPERTY_SIZE: Self = Self(-66562);
    pub const NON_PCM_CLIENT_FORMAT: Self = Self(-66563);
    pub const INVALID_CHANNEL_MAP: Self = Self(-66564);
    pub const INVALID_OPERATION_ORDER: Self = Self(-66565);
    pub const INVALID_DATA_FORMAT: Self = Self(-66566);
    pub const MAX_PACKET_SIZE_UNKNOWN: Self = Self(-66567);
    pub const INVALID_SEEK: Self = Self(-66568);
    pub const ASYNC_WRITE_TOO_LARGE: Self = Self(-66569);
    pub const ASYNC_WRITE_BUFFER_OVERFLOW: Self = Self(-66570);

    /// Convert a native return value into a `Result`
    pub fn check(self) -> std::result::Result<(), OsStatus> {
        if self == Self::NO_ERR {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::NO_ERR
    }

    /// The code as a four-character code, if every byte is printable ASCII
    pub fn four_char_code(self) -> Option<String> {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            Some(bytes.iter().map(|&b| b as char).collect())
        } else {
            None
        }
    }
}

impl From<i32> for OsStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for OsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.four_char_code() {
            Some(code) => write!(f, "{} ('{}')", self.0, code),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Unified error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The native layer returned a non-zero status
    #[error("OSStatus error {0}")]
    Status(OsStatus),

    /// A setter was refused before reaching the native layer
    #[error("Property {property:?} is not writable")]
    NotWritable { property: PropertyId },

    /// The native value size does not fit the caller's type. `expected` is
    /// the size the Rust side needs, `actual` the size the native side reported.
    #[error("Property {property:?} expects {expected} bytes, got {actual}")]
    PropertySize {
        property: PropertyId,
        expected: u32,
        actual: u32,
    },

    #[error(transparent)]
    Script(#[from] ScriptError),

    /// A path that cannot be handed to the native layer
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

impl Error {
    /// The status code this error maps to
    pub fn status(&self) -> OsStatus {
        match self {
            Self::Status(status) => *status,
            Self::NotWritable { .. } => OsStatus::PARAM_ERR,
            Self::PropertySize { .. } => OsStatus::INVALID_PROPERTY_SIZE,
            Self::Script(e) => e.status,
            Self::InvalidPath(_) => OsStatus::PARAM_ERR,
        }
    }
}

impl From<OsStatus> for Error {
    fn from(status: OsStatus) -> Self {
        Self::Status(status)
    }
}

/// Result type alias for all operations in this crate
pub type Result<T> = std::result::Result<T, Error>;
