//! Extended audio file wrapper
//!
//! Typed access to AudioToolbox's ExtAudioFile: one owned handle per file,
//! properties read and written through the native size-query protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          ExtAudioFile<A> (owned handle)      │
//! │  typed properties, writes, Drop = dispose   │
//! └─────────────┬───────────────────────────────┘
//!               │
//!               ▼
//! ┌─────────────────────────────────────────────┐
//! │         trait ExtAudioFileApi                │
//! │  open_url(), property_info(), get/set,       │
//! │  write(), write_async(), dispose()           │
//! └──────┬──────────────────────┬───────────────┘
//!        ▼                      ▼
//! ┌──────────────┐    ┌──────────────┐
//! │ CoreAudio    │    │ Mock         │
//! │ (macOS)      │    │ (tests)      │
//! └──────────────┘    └──────────────┘
//! ```

pub mod backend;
pub mod ext_audio_file;
pub mod types;

#[cfg(target_os = "macos")]
pub mod coreaudio_backend;

#[cfg(test)]
pub(crate) mod mock;

// Re-exports for convenience
pub use backend::{ExtAudioFileApi, NativeResult};
pub use ext_audio_file::{ExtAudioFile, PendingWrite};
pub use types::*;

#[cfg(target_os = "macos")]
pub use coreaudio_backend::CoreAudioFileApi;
#[cfg(target_os = "macos")]
pub use ext_audio_file::SystemExtAudioFile;
