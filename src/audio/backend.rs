//! Native ExtAudioFile API abstraction
//!
//! This trait mirrors the AudioToolbox ExtAudioFile entry points one-to-one.
//! [`ExtAudioFile`](crate::audio::ExtAudioFile) is written against it, so the
//! handle wrapper never touches FFI itself.
//!
//! # Important
//!
//! This file must NOT contain any platform-specific imports (coreaudio-sys,
//! core-foundation, etc.). All platform-specific code goes in the
//! implementation files.

use std::fmt;
use std::path::Path;

use crate::audio::types::*;
use crate::error::OsStatus;

/// Outcome of a native call: `Err` carries the non-zero status it returned
pub type NativeResult<T> = std::result::Result<T, OsStatus>;

/// Native extended audio file API
///
/// Every method forwards to a single native call. None of them interpret the
/// data; sizes and buffers are passed through unchanged.
pub trait ExtAudioFileApi {
    /// Opaque handle to one open file (`ExtAudioFileRef` on macOS)
    type Handle: Copy + fmt::Debug;

    /// Open an existing file for reading (`ExtAudioFileOpenURL`)
    fn open_url(&self, path: &Path) -> NativeResult<Self::Handle>;

    /// Create a new file for writing (`ExtAudioFileCreateWithURL`)
    ///
    /// `format` may be normalised in place by the framework. `channel_layout`
    /// holds the encoded native `AudioChannelLayout`, if any.
    fn create_with_url(
        &self,
        path: &Path,
        file_type: AudioFileType,
        format: &mut StreamDescription,
        channel_layout: Option<&[u8]>,
        flags: AudioFileFlags,
    ) -> NativeResult<Self::Handle>;

    /// Size of a property's value and whether it can be set
    /// (`ExtAudioFileGetPropertyInfo`)
    fn property_info(&self, file: Self::Handle, id: PropertyId) -> NativeResult<PropertyInfo>;

    /// Copy a property value into `data` (`ExtAudioFileGetProperty`)
    ///
    /// Returns the number of bytes actually written.
    fn get_property(
        &self,
        file: Self::Handle,
        id: PropertyId,
        data: &mut [u8],
    ) -> NativeResult<u32>;

    /// Store a property value (`ExtAudioFileSetProperty`)
    fn set_property(&self, file: Self::Handle, id: PropertyId, data: &[u8]) -> NativeResult<()>;

    /// Synchronously write frames in the client format (`ExtAudioFileWrite`)
    fn write(&self, file: Self::Handle, frames: u32, buffers: &[AudioBuffer<'_>]) -> NativeResult<()>;

    /// Queue frames for a background write (`ExtAudioFileWriteAsync`)
    ///
    /// `None` with zero frames initialises the asynchronous writer. A failure
    /// of a queued write is reported by a later call on the same handle.
    fn write_async(
        &self,
        file: Self::Handle,
        frames: u32,
        buffers: Option<&[AudioBuffer<'_>]>,
    ) -> NativeResult<()>;

    /// Move the read/write position, in sample frames (`ExtAudioFileSeek`)
    fn seek(&self, file: Self::Handle, frame: i64) -> NativeResult<()>;

    /// Current position in sample frames (`ExtAudioFileTell`)
    fn tell(&self, file: Self::Handle) -> NativeResult<i64>;

    /// Close the file and release the handle (`ExtAudioFileDispose`)
    fn dispose(&self, file: Self::Handle) -> NativeResult<()>;
}
