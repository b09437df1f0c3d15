//! Typed Rust extensions over macOS audio, graphics and scripting frameworks
//!
//! - [`audio`]: owned `ExtAudioFile` handles with a typed property protocol
//! - [`graphics`]: `CGBitmapInfo` alpha info and byte order fields
//! - [`geometry`]: points, sizes, rects and ranges with string round-tripping
//! - [`data`]: byte array helpers for `bytes` buffers and UUID conversion
//! - [`applescript`]: compile/execute results with mapped error dictionaries
//!
//! Everything that can fail returns [`Result`], carrying the native status
//! code through [`Error::status`].

pub mod applescript;
pub mod audio;
pub mod data;
pub mod error;
pub mod geometry;
pub mod graphics;

pub use applescript::{Script, ScriptEngine, ScriptError, ScriptErrorInfo};
pub use audio::{ExtAudioFile, ExtAudioFileApi, PropertyId, StreamDescription};
pub use data::{ByteArrayExt, MutableByteArrayExt};
pub use error::{Error, OsStatus, Result};
pub use geometry::{Point, Range, Rect, Size};
pub use graphics::{BitmapInfo, ImageAlphaInfo};

#[cfg(target_os = "macos")]
pub use applescript::NativeAppleScript;
#[cfg(target_os = "macos")]
pub use audio::SystemExtAudioFile;
