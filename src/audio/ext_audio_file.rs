//! Owned extended audio file handle
//!
//! [`ExtAudioFile`] owns one native handle for its whole lifetime and disposes
//! it exactly once. Properties go through the native two-step protocol:
//! ask for the value size (and writability), then copy the value in or out.
//!
//! # Asynchronous writes
//!
//! The framework reports the failure of a queued write from some later call
//! on the same handle. [`ExtAudioFile::write_async`] returns a
//! [`PendingWrite`] for each submission, and the next native call made
//! through the wrapper (any call, including another `write_async` and the
//! final dispose) settles every outstanding `PendingWrite` with its own
//! outcome. That call's caller still receives the error too.
//!
//! # Threads
//!
//! The native handle must not be used from several threads at once. The
//! wrapper does no locking; every method takes `&mut self`.

use std::ffi::c_void;
use std::mem;
use std::path::Path;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, warn};
use once_cell::unsync::OnceCell;

use crate::audio::backend::{ExtAudioFileApi, NativeResult};
use crate::audio::types::*;
use crate::error::{Error, Result};

/// An open ExtAudioFile
pub struct ExtAudioFile<A: ExtAudioFileApi> {
    api: A,
    handle: A::Handle,
    /// Set once the handle has been disposed
    disposed: bool,
    /// Async writes waiting for the next native call to report on them
    pending: Vec<Sender<Result<()>>>,
}

impl<A: ExtAudioFileApi> ExtAudioFile<A> {
    /// Open an existing file for reading
    pub fn open_with(api: A, path: &Path) -> Result<Self> {
        let handle = api.open_url(path)?;
        debug!("[ExtAudioFile] Opened {} ({:?})", path.display(), handle);
        Ok(Self::from_handle(api, handle))
    }

    /// Create a new file
    ///
    /// `format` is the file data format; the framework may fill in or adjust
    /// fields, which are written back into it.
    pub fn create_with(
        api: A,
        path: &Path,
        file_type: AudioFileType,
        format: &mut StreamDescription,
        options: &CreateOptions,
    ) -> Result<Self> {
        let layout = options.channel_layout.as_ref().map(ChannelLayout::to_bytes);
        let handle = api.create_with_url(path, file_type, format, layout.as_deref(), options.flags)?;
        debug!(
            "[ExtAudioFile] Created {} as {:?} at {} Hz ({:?})",
            path.display(),
            file_type,
            format.sample_rate,
            handle
        );
        Ok(Self::from_handle(api, handle))
    }

    fn from_handle(api: A, handle: A::Handle) -> Self {
        Self {
            api,
            handle,
            disposed: false,
            pending: Vec::new(),
        }
    }

    /// The raw native handle. Still owned by this wrapper.
    pub fn as_raw(&self) -> A::Handle {
        self.handle
    }

    /// Number of async writes not yet settled by a later call
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Convert a native outcome and report it to outstanding async writes
    fn settle<T>(&mut self, outcome: NativeResult<T>) -> Result<T> {
        let outcome = outcome.map_err(Error::from);
        if !self.pending.is_empty() {
            let shared = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
            for waiter in self.pending.drain(..) {
                // The PendingWrite may already be gone
                let _ = waiter.send(shared.clone());
            }
        }
        outcome
    }

    // === Property protocol ===

    /// Size of a property's value and whether it can be set
    pub fn property_info(&mut self, id: PropertyId) -> Result<PropertyInfo> {
        let outcome = self.api.property_info(self.handle, id);
        self.settle(outcome)
    }

    /// Read a fixed-layout property value
    pub fn property<T: PropertyData>(&mut self, id: PropertyId) -> Result<T> {
        let info = self.property_info(id)?;
        let wanted = mem::size_of::<T>() as u32;
        if info.size < wanted {
            return Err(Error::PropertySize {
                property: id,
                expected: wanted,
                actual: info.size,
            });
        }

        let mut buffer = vec![0u8; info.size as usize];
        let outcome = self.api.get_property(self.handle, id, &mut buffer);
        let written = self.settle(outcome)?;

        buffer
            .get(..written as usize)
            .and_then(T::from_bytes)
            .ok_or(Error::PropertySize {
                property: id,
                expected: wanted,
                actual: written,
            })
    }

    /// Read a property value as raw bytes, for variable-length values
    pub fn property_bytes(&mut self, id: PropertyId) -> Result<Vec<u8>> {
        let info = self.property_info(id)?;
        let mut buffer = vec![0u8; info.size as usize];
        let outcome = self.api.get_property(self.handle, id, &mut buffer);
        let written = self.settle(outcome)?;
        buffer.truncate(written as usize);
        Ok(buffer)
    }

    /// Store a fixed-layout property value
    ///
    /// Fails with [`Error::NotWritable`] without calling the native setter when
    /// the property is read-only, and with [`Error::PropertySize`] when the
    /// native size differs from `T`.
    pub fn set_property<T: PropertyData>(&mut self, id: PropertyId, value: &T) -> Result<()> {
        let info = self.writable_info(id)?;
        let wanted = mem::size_of::<T>() as u32;
        if info.size != wanted {
            return Err(Error::PropertySize {
                property: id,
                expected: wanted,
                actual: info.size,
            });
        }
        let outcome = self.api.set_property(self.handle, id, value.as_bytes());
        self.settle(outcome)
    }

    /// Store a property value from raw bytes
    pub fn set_property_bytes(&mut self, id: PropertyId, data: &[u8]) -> Result<()> {
        self.writable_info(id)?;
        let outcome = self.api.set_property(self.handle, id, data);
        self.settle(outcome)
    }

    fn writable_info(&mut self, id: PropertyId) -> Result<PropertyInfo> {
        let info = self.property_info(id)?;
        if !info.writable {
            warn!("[ExtAudioFile] Refusing to set read-only property {:?}", id);
            return Err(Error::NotWritable { property: id });
        }
        Ok(info)
    }

    fn channel_layout(&mut self, id: PropertyId) -> Result<ChannelLayout> {
        let bytes = self.property_bytes(id)?;
        ChannelLayout::from_bytes(&bytes).ok_or(Error::PropertySize {
            property: id,
            expected: ChannelLayout::HEADER_SIZE as u32,
            actual: bytes.len() as u32,
        })
    }

    // === Typed properties ===

    /// Format of the data stored in the file
    pub fn file_data_format(&mut self) -> Result<StreamDescription> {
        self.property(PropertyId::FileDataFormat)
    }

    /// Channel layout of the file. No setter yet.
    pub fn file_channel_layout(&mut self) -> Result<ChannelLayout> {
        self.channel_layout(PropertyId::FileChannelLayout)
    }

    /// Format the caller reads and writes in
    pub fn client_data_format(&mut self) -> Result<StreamDescription> {
        self.property(PropertyId::ClientDataFormat)
    }

    pub fn set_client_data_format(&mut self, format: &StreamDescription) -> Result<()> {
        self.set_property(PropertyId::ClientDataFormat, format)
    }

    /// Channel layout of the client format. No setter yet.
    pub fn client_channel_layout(&mut self) -> Result<ChannelLayout> {
        self.channel_layout(PropertyId::ClientChannelLayout)
    }

    /// Manufacturer of the codec doing the conversion. No setter yet.
    pub fn codec_manufacturer(&mut self) -> Result<u32> {
        self.property(PropertyId::CodecManufacturer)
    }

    /// The `AudioConverterRef` in use, null when formats match.
    /// Owned by the file; do not dispose it.
    pub fn audio_converter(&mut self) -> Result<OpaqueRef> {
        self.property(PropertyId::AudioConverter)
    }

    /// The underlying `AudioFileID`. Owned by the file.
    pub fn audio_file(&mut self) -> Result<OpaqueRef> {
        self.property(PropertyId::AudioFile)
    }

    pub fn file_max_packet_size(&mut self) -> Result<u32> {
        self.property(PropertyId::FileMaxPacketSize)
    }

    pub fn client_max_packet_size(&mut self) -> Result<u32> {
        self.property(PropertyId::ClientMaxPacketSize)
    }

    /// Length of the file in sample frames of the file data format
    pub fn file_length_frames(&mut self) -> Result<i64> {
        self.property(PropertyId::FileLengthFrames)
    }

    /// Set the converter configuration (`CFPropertyListRef`). `None` clears it.
    pub fn set_converter_config(&mut self, config: Option<OpaqueRef>) -> Result<()> {
        let config = config.unwrap_or_default();
        self.set_property(PropertyId::ConverterConfig, &config)
    }

    pub fn set_io_buffer_size(&mut self, bytes: u32) -> Result<()> {
        self.set_property(PropertyId::IoBufferSizeBytes, &bytes)
    }

    /// Hand the file a caller-owned I/O buffer
    ///
    /// # Safety
    ///
    /// `buffer` must stay valid, and unused by anything else, until the file is
    /// dropped or another buffer is set.
    pub unsafe fn set_io_buffer(&mut self, buffer: *mut c_void) -> Result<()> {
        self.set_property(PropertyId::IoBuffer, &OpaqueRef(buffer))
    }

    pub fn set_packet_table(&mut self, table: &PacketTableInfo) -> Result<()> {
        self.set_property(PropertyId::PacketTable, table)
    }

    // === I/O ===

    /// Write frames in the client data format, blocking until done
    pub fn write(&mut self, frames: u32, buffers: &[AudioBuffer<'_>]) -> Result<()> {
        let outcome = self.api.write(self.handle, frames, buffers);
        self.settle(outcome)
    }

    /// Queue frames for a background write
    ///
    /// An immediate rejection is returned here. A failure discovered later is
    /// delivered to the returned [`PendingWrite`] by the next call made on this
    /// file, and is also that call's error.
    pub fn write_async(&mut self, frames: u32, buffers: &[AudioBuffer<'_>]) -> Result<PendingWrite> {
        let outcome = self.api.write_async(self.handle, frames, Some(buffers));
        self.settle(outcome)?;

        let (sender, receiver) = crossbeam_channel::bounded(1);
        self.pending.push(sender);
        Ok(PendingWrite::new(receiver))
    }

    /// Set up the async writer ahead of time, e.g. before entering a
    /// realtime context
    pub fn prime_async_writes(&mut self) -> Result<()> {
        let outcome = self.api.write_async(self.handle, 0, None);
        self.settle(outcome)
    }

    /// Move to a sample frame position (client format)
    pub fn seek(&mut self, frame: i64) -> Result<()> {
        let outcome = self.api.seek(self.handle, frame);
        self.settle(outcome)
    }

    /// Current sample frame position
    pub fn tell(&mut self) -> Result<i64> {
        let outcome = self.api.tell(self.handle);
        self.settle(outcome)
    }

    /// Dispose the handle now and report the outcome
    ///
    /// Any async write still outstanding is settled by this call.
    pub fn close(mut self) -> Result<()> {
        self.dispose_handle()
    }

    fn dispose_handle(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        let outcome = self.api.dispose(self.handle);
        debug!("[ExtAudioFile] Disposed {:?}", self.handle);
        self.settle(outcome)
    }
}

impl<A: ExtAudioFileApi> Drop for ExtAudioFile<A> {
    fn drop(&mut self) {
        if let Err(e) = self.dispose_handle() {
            error!("[ExtAudioFile] Error during dispose: {}", e);
        }
    }
}

/// Outcome of one [`ExtAudioFile::write_async`] submission
///
/// Settled by the next native call made on the same file.
#[derive(Debug)]
pub struct PendingWrite {
    receiver: Receiver<Result<()>>,
    outcome: OnceCell<Result<()>>,
}

impl PendingWrite {
    fn new(receiver: Receiver<Result<()>>) -> Self {
        Self {
            receiver,
            outcome: OnceCell::new(),
        }
    }

    /// The outcome, or None while no later call has reported on this write
    ///
    /// The outcome is that of the settling call. The native API does not say
    /// which submission an error belongs to, so an `Err` here may be the
    /// settling call's own failure rather than this write's.
    pub fn result(&self) -> Option<Result<()>> {
        if self.outcome.get().is_none() {
            if let Ok(outcome) = self.receiver.try_recv() {
                let _ = self.outcome.set(outcome);
            }
        }
        self.outcome.get().cloned()
    }

    pub fn is_settled(&self) -> bool {
        self.result().is_some()
    }
}

#[cfg(target_os = "macos")]
mod system {
    use super::*;
    use crate::audio::coreaudio_backend::CoreAudioFileApi;

    /// ExtAudioFile backed by AudioToolbox
    pub type SystemExtAudioFile = ExtAudioFile<CoreAudioFileApi>;

    impl ExtAudioFile<CoreAudioFileApi> {
        pub fn open(path: &Path) -> Result<Self> {
            Self::open_with(CoreAudioFileApi, path)
        }

        pub fn create(
            path: &Path,
            file_type: AudioFileType,
            format: &mut StreamDescription,
            options: &CreateOptions,
        ) -> Result<Self> {
            Self::create_with(CoreAudioFileApi, path, file_type, format, options)
        }
    }
}

#[cfg(target_os = "macos")]
pub use system::SystemExtAudioFile;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::{MockApi, Op};
    use crate::error::OsStatus;

    fn open_mock() -> (MockApi, ExtAudioFile<MockApi>, tempfile::NamedTempFile) {
        let api = MockApi::new();
        let file = tempfile::NamedTempFile::new().unwrap();
        let audio = ExtAudioFile::open_with(api.clone(), file.path()).unwrap();
        (api, audio, file)
    }

    #[test]
    fn test_open_missing_file_fails_without_dispose() {
        let api = MockApi::new();
        let dir = tempfile::tempdir().unwrap();
        let result = ExtAudioFile::open_with(api.clone(), &dir.path().join("missing.caf"));

        let err = result.err().expect("open should fail");
        assert_eq!(err.status(), OsStatus::FILE_NOT_FOUND);
        assert_eq!(api.count(Op::Open), 1);
        assert_eq!(api.count(Op::Dispose), 0);
    }

    #[test]
    fn test_create_failure_does_not_dispose() {
        let api = MockApi::new();
        api.fail(Op::Create, OsStatus(i32::from_be_bytes(*b"fmt?")));
        let dir = tempfile::tempdir().unwrap();
        let mut format = StreamDescription::linear_pcm_f32(44100.0, 2);

        let result = ExtAudioFile::create_with(
            api.clone(),
            &dir.path().join("out.caf"),
            AudioFileType::Caf,
            &mut format,
            &CreateOptions::default(),
        );
        assert!(result.is_err());
        assert_eq!(api.count(Op::Dispose), 0);
    }

    #[test]
    fn test_drop_disposes_exactly_once() {
        let (api, audio, _file) = open_mock();
        let handle = audio.as_raw();
        drop(audio);
        assert_eq!(api.count(Op::Dispose), 1);
        assert_eq!(api.disposed(), vec![handle]);
    }

    #[test]
    fn test_close_then_drop_disposes_once() {
        let (api, audio, _file) = open_mock();
        audio.close().unwrap();
        assert_eq!(api.count(Op::Dispose), 1);
    }

    #[test]
    fn test_create_writes_back_normalised_format() {
        let api = MockApi::new();
        let dir = tempfile::tempdir().unwrap();
        let mut format = StreamDescription {
            sample_rate: 48000.0,
            format_id: K_AUDIO_FORMAT_LINEAR_PCM,
            format_flags: K_AUDIO_FORMAT_FLAG_IS_SIGNED_INTEGER | K_AUDIO_FORMAT_FLAG_IS_PACKED,
            channels_per_frame: 2,
            bits_per_channel: 24,
            frames_per_packet: 1,
            ..Default::default()
        };
        let options = CreateOptions::default()
            .with_channel_layout(ChannelLayout::stereo())
            .with_flags(AudioFileFlags::ERASE_FILE);

        let mut audio = ExtAudioFile::create_with(
            api.clone(),
            &dir.path().join("out.wav"),
            AudioFileType::Wave,
            &mut format,
            &options,
        )
        .unwrap();

        assert_eq!(format.bytes_per_frame, 6);
        assert_eq!(format.bytes_per_packet, 6);
        assert_eq!(api.last_create_flags(), Some(AudioFileFlags::ERASE_FILE));
        assert_eq!(audio.file_data_format().unwrap(), format);
        assert_eq!(audio.file_channel_layout().unwrap(), ChannelLayout::stereo());
    }

    #[test]
    fn test_get_queries_size_once_then_gets_once() {
        let (api, mut audio, _file) = open_mock();
        api.set_property_value(PropertyId::FileLengthFrames, &88200i64, false);

        assert_eq!(audio.file_length_frames().unwrap(), 88200);
        assert_eq!(api.count(Op::PropertyInfo), 1);
        assert_eq!(api.count(Op::GetProperty), 1);
        assert_eq!(api.last_get_size(), Some(8));
    }

    #[test]
    fn test_read_only_accessors() {
        let (api, mut audio, _file) = open_mock();
        let converter = OpaqueRef(0x1000 as *mut c_void);
        api.set_property_value(PropertyId::CodecManufacturer, &u32::from_be_bytes(*b"appl"), false);
        api.set_property_value(PropertyId::AudioConverter, &converter, false);
        api.set_property_value(PropertyId::AudioFile, &OpaqueRef::null(), false);
        api.set_property_value(PropertyId::FileMaxPacketSize, &4096u32, false);
        api.set_property_value(PropertyId::ClientMaxPacketSize, &8u32, false);

        assert_eq!(audio.codec_manufacturer().unwrap(), u32::from_be_bytes(*b"appl"));
        assert_eq!(audio.audio_converter().unwrap(), converter);
        assert!(audio.audio_file().unwrap().is_null());
        assert_eq!(audio.file_max_packet_size().unwrap(), 4096);
        assert_eq!(audio.client_max_packet_size().unwrap(), 8);
        assert_eq!(api.count(Op::PropertyInfo), 5);
        assert_eq!(api.count(Op::GetProperty), 5);
    }

    #[test]
    fn test_unknown_property_reports_status() {
        let (_api, mut audio, _file) = open_mock();
        let err = audio.client_channel_layout().unwrap_err();
        assert_eq!(err, Error::Status(OsStatus::INVALID_PROPERTY));
    }

    #[test]
    fn test_set_client_format() {
        let (api, mut audio, _file) = open_mock();
        api.set_property_value(PropertyId::ClientDataFormat, &StreamDescription::default(), true);

        let client = StreamDescription::linear_pcm_f32(44100.0, 2);
        audio.set_client_data_format(&client).unwrap();
        assert_eq!(audio.client_data_format().unwrap(), client);
        assert_eq!(api.count(Op::SetProperty), 1);
    }

    #[test]
    fn test_set_read_only_never_calls_native_set() {
        let (api, mut audio, _file) = open_mock();
        api.set_property_value(PropertyId::IoBufferSizeBytes, &0u32, false);
        api.set_property_value(PropertyId::PacketTable, &PacketTableInfo::default(), false);

        let err = audio.set_io_buffer_size(32768).unwrap_err();
        assert_eq!(
            err,
            Error::NotWritable {
                property: PropertyId::IoBufferSizeBytes
            }
        );
        assert_eq!(err.status(), OsStatus::PARAM_ERR);

        let err = audio.set_packet_table(&PacketTableInfo::default()).unwrap_err();
        assert_eq!(err.status(), OsStatus::PARAM_ERR);
        assert_eq!(api.count(Op::SetProperty), 0);
    }

    #[test]
    fn test_set_size_mismatch() {
        let (api, mut audio, _file) = open_mock();
        api.set_property_value(PropertyId::IoBufferSizeBytes, &0u64, true);

        let err = audio.set_io_buffer_size(1024).unwrap_err();
        assert_eq!(
            err,
            Error::PropertySize {
                property: PropertyId::IoBufferSizeBytes,
                expected: 4,
                actual: 8,
            }
        );
        assert_eq!(err.status(), OsStatus::INVALID_PROPERTY_SIZE);
        assert_eq!(api.count(Op::SetProperty), 0);
    }

    #[test]
    fn test_get_size_too_small() {
        let (api, mut audio, _file) = open_mock();
        api.set_property_value(PropertyId::FileLengthFrames, &7u32, false);

        let err = audio.file_length_frames().unwrap_err();
        assert_eq!(
            err,
            Error::PropertySize {
                property: PropertyId::FileLengthFrames,
                expected: 8,
                actual: 4,
            }
        );
        assert_eq!(api.count(Op::GetProperty), 0);
    }

    #[test]
    fn test_converter_config_none_is_null() {
        let (api, mut audio, _file) = open_mock();
        api.set_property_value(PropertyId::ConverterConfig, &OpaqueRef(0x20 as *mut c_void), true);

        audio.set_converter_config(None).unwrap();
        let stored: OpaqueRef = audio.property(PropertyId::ConverterConfig).unwrap();
        assert!(stored.is_null());
    }

    #[test]
    fn test_converter_config_some_is_stored() {
        let (api, mut audio, _file) = open_mock();
        api.set_property_value(PropertyId::ConverterConfig, &OpaqueRef::null(), true);

        let config = OpaqueRef(0x40 as *mut c_void);
        audio.set_converter_config(Some(config)).unwrap();
        let stored: OpaqueRef = audio.property(PropertyId::ConverterConfig).unwrap();
        assert_eq!(stored, config);
        assert_eq!(api.count(Op::SetProperty), 1);
    }

    #[test]
    fn test_io_buffer_and_packet_table() {
        let (api, mut audio, _file) = open_mock();
        api.set_property_value(PropertyId::IoBuffer, &OpaqueRef::null(), true);
        api.set_property_value(PropertyId::PacketTable, &PacketTableInfo::default(), true);

        let mut buffer = vec![0u8; 4096];
        unsafe { audio.set_io_buffer(buffer.as_mut_ptr() as *mut c_void) }.unwrap();

        let table = PacketTableInfo {
            number_valid_frames: 44100,
            priming_frames: 2112,
            remainder_frames: 700,
        };
        audio.set_packet_table(&table).unwrap();
        assert_eq!(audio.property::<PacketTableInfo>(PropertyId::PacketTable).unwrap(), table);
        assert_eq!(api.count(Op::SetProperty), 2);
    }

    #[test]
    fn test_write_and_position() {
        let (api, mut audio, _file) = open_mock();
        let samples = [0u8; 64];
        audio.write(8, &[AudioBuffer::interleaved(2, &samples)]).unwrap();
        assert_eq!(audio.tell().unwrap(), 8);
        audio.seek(2).unwrap();
        assert_eq!(audio.tell().unwrap(), 2);

        api.fail(Op::Write, OsStatus::INVALID_OPERATION_ORDER);
        let err = audio.write(1, &[AudioBuffer::interleaved(2, &samples[..8])]).unwrap_err();
        assert_eq!(err.status(), OsStatus::INVALID_OPERATION_ORDER);
    }

    #[test]
    fn test_async_write_settled_by_next_call() {
        let (_api, mut audio, _file) = open_mock();
        let samples = [0u8; 32];

        audio.prime_async_writes().unwrap();
        let pending = audio.write_async(4, &[AudioBuffer::interleaved(2, &samples)]).unwrap();
        assert!(!pending.is_settled());
        assert_eq!(audio.pending_writes(), 1);

        assert_eq!(audio.tell().unwrap(), 4);
        assert_eq!(pending.result(), Some(Ok(())));
        assert_eq!(audio.pending_writes(), 0);
    }

    #[test]
    fn test_async_write_error_surfaces_later() {
        let (api, mut audio, _file) = open_mock();
        let samples = [0u8; 32];

        api.fail_async(OsStatus::ASYNC_WRITE_BUFFER_OVERFLOW);
        let first = audio.write_async(4, &[AudioBuffer::interleaved(2, &samples)]).unwrap();
        let second = audio.write_async(4, &[AudioBuffer::interleaved(2, &samples)]);

        // The failure of the first write is reported by the second submission
        let expected = Error::Status(OsStatus::ASYNC_WRITE_BUFFER_OVERFLOW);
        assert_eq!(second.unwrap_err(), expected);
        assert_eq!(first.result(), Some(Err(expected)));
    }

    #[test]
    fn test_async_write_rejected_at_submission() {
        let (api, mut audio, _file) = open_mock();
        let samples = [0u8; 32];

        api.fail(Op::WriteAsync, OsStatus::ASYNC_WRITE_TOO_LARGE);
        let err = audio
            .write_async(4, &[AudioBuffer::interleaved(2, &samples)])
            .unwrap_err();
        assert_eq!(err, Error::Status(OsStatus::ASYNC_WRITE_TOO_LARGE));
        assert_eq!(audio.pending_writes(), 0);
        assert_eq!(audio.tell().unwrap(), 0);
    }

    #[test]
    fn test_unrelated_failure_settles_pending_write() {
        let (_api, mut audio, _file) = open_mock();
        let samples = [0u8; 32];
        let pending = audio.write_async(4, &[AudioBuffer::interleaved(2, &samples)]).unwrap();

        // The settling call's own error is all the pending write can report
        let err = audio.client_channel_layout().unwrap_err();
        assert_eq!(err, Error::Status(OsStatus::INVALID_PROPERTY));
        assert_eq!(pending.result(), Some(Err(err)));
        assert_eq!(audio.pending_writes(), 0);
    }

    #[test]
    fn test_drop_settles_pending_writes() {
        let (api, mut audio, _file) = open_mock();
        let samples = [0u8; 16];
        let pending = audio.write_async(2, &[AudioBuffer::interleaved(2, &samples)]).unwrap();

        drop(audio);
        assert_eq!(pending.result(), Some(Ok(())));
        assert_eq!(api.count(Op::Dispose), 1);
    }
}
