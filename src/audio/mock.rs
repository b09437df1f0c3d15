//! Recording in-memory ExtAudioFile API for tests
//!
//! Stores property values as raw bytes, counts every native call per
//! operation and can be told to fail the next call of a given kind. A failing
//! async write is modelled the way the framework does it: the submission
//! succeeds and the next call on the handle returns the error.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::backend::{ExtAudioFileApi, NativeResult};
use crate::audio::types::*;
use crate::error::OsStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Open,
    Create,
    PropertyInfo,
    GetProperty,
    SetProperty,
    Write,
    WriteAsync,
    Seek,
    Tell,
    Dispose,
}

#[derive(Debug, Clone)]
struct StoredProperty {
    bytes: Vec<u8>,
    writable: bool,
}

#[derive(Debug, Default)]
struct MockState {
    next_handle: u32,
    calls: HashMap<Op, usize>,
    properties: HashMap<PropertyId, StoredProperty>,
    failures: HashMap<Op, OsStatus>,
    /// Failure of a queued async write, reported by the next call
    deferred: Option<OsStatus>,
    async_failure: Option<OsStatus>,
    position: i64,
    disposed: Vec<u32>,
    last_get_size: Option<usize>,
    last_create_flags: Option<AudioFileFlags>,
}

#[derive(Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, op: Op) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Fail the next call of `op` with `status`
    pub fn fail(&self, op: Op, status: OsStatus) {
        self.state.lock().failures.insert(op, status);
    }

    /// Accept the next async write but report `status` from the following call
    pub fn fail_async(&self, status: OsStatus) {
        self.state.lock().async_failure = Some(status);
    }

    pub fn set_property_value<T: PropertyData>(&self, id: PropertyId, value: &T, writable: bool) {
        self.state.lock().properties.insert(
            id,
            StoredProperty {
                bytes: value.as_bytes().to_vec(),
                writable,
            },
        );
    }

    pub fn disposed(&self) -> Vec<u32> {
        self.state.lock().disposed.clone()
    }

    pub fn last_get_size(&self) -> Option<usize> {
        self.state.lock().last_get_size
    }

    pub fn last_create_flags(&self) -> Option<AudioFileFlags> {
        self.state.lock().last_create_flags
    }

    /// Count the call and apply any scripted failure
    fn enter(&self, op: Op) -> NativeResult<parking_lot::MutexGuard<'_, MockState>> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        if let Some(status) = state.deferred.take() {
            return Err(status);
        }
        let failure = state.failures.remove(&op);
        match failure {
            Some(status) => Err(status),
            None => Ok(state),
        }
    }
}

impl MockState {
    fn new_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl ExtAudioFileApi for MockApi {
    type Handle = u32;

    fn open_url(&self, path: &Path) -> NativeResult<u32> {
        let mut state = self.enter(Op::Open)?;
        if !path.exists() {
            return Err(OsStatus::FILE_NOT_FOUND);
        }
        Ok(state.new_handle())
    }

    fn create_with_url(
        &self,
        _path: &Path,
        _file_type: AudioFileType,
        format: &mut StreamDescription,
        channel_layout: Option<&[u8]>,
        flags: AudioFileFlags,
    ) -> NativeResult<u32> {
        let mut state = self.enter(Op::Create)?;

        // Fill in derived sizes the way the framework does for packed PCM
        if format.is_linear_pcm() && format.bytes_per_frame == 0 {
            format.bytes_per_frame = format.bits_per_channel / 8 * format.channels_per_frame;
            format.bytes_per_packet = format.bytes_per_frame * format.frames_per_packet.max(1);
        }

        state.properties.insert(
            PropertyId::FileDataFormat,
            StoredProperty {
                bytes: format.as_bytes().to_vec(),
                writable: false,
            },
        );
        if let Some(layout) = channel_layout {
            state.properties.insert(
                PropertyId::FileChannelLayout,
                StoredProperty {
                    bytes: layout.to_vec(),
                    writable: false,
                },
            );
        }
        state.last_create_flags = Some(flags);
        Ok(state.new_handle())
    }

    fn property_info(&self, _file: u32, id: PropertyId) -> NativeResult<PropertyInfo> {
        let state = self.enter(Op::PropertyInfo)?;
        state
            .properties
            .get(&id)
            .map(|p| PropertyInfo {
                size: p.bytes.len() as u32,
                writable: p.writable,
            })
            .ok_or(OsStatus::INVALID_PROPERTY)
    }

    fn get_property(&self, _file: u32, id: PropertyId, data: &mut [u8]) -> NativeResult<u32> {
        let mut state = self.enter(Op::GetProperty)?;
        state.last_get_size = Some(data.len());
        let property = state.properties.get(&id).ok_or(OsStatus::INVALID_PROPERTY)?;
        if data.len() < property.bytes.len() {
            return Err(OsStatus::INVALID_PROPERTY_SIZE);
        }
        data[..property.bytes.len()].copy_from_slice(&property.bytes);
        Ok(property.bytes.len() as u32)
    }

    fn set_property(&self, _file: u32, id: PropertyId, data: &[u8]) -> NativeResult<()> {
        let mut state = self.enter(Op::SetProperty)?;
        let property = state
            .properties
            .get_mut(&id)
            .ok_or(OsStatus::INVALID_PROPERTY)?;
        if !property.writable {
            return Err(OsStatus::PARAM_ERR);
        }
        property.bytes = data.to_vec();
        Ok(())
    }

    fn write(&self, _file: u32, frames: u32, _buffers: &[AudioBuffer<'_>]) -> NativeResult<()> {
        let mut state = self.enter(Op::Write)?;
        state.position += i64::from(frames);
        Ok(())
    }

    fn write_async(
        &self,
        _file: u32,
        frames: u32,
        buffers: Option<&[AudioBuffer<'_>]>,
    ) -> NativeResult<()> {
        let mut state = self.enter(Op::WriteAsync)?;
        if buffers.is_none() && frames != 0 {
            return Err(OsStatus::PARAM_ERR);
        }
        if let Some(status) = state.async_failure.take() {
            state.deferred = Some(status);
            return Ok(());
        }
        state.position += i64::from(frames);
        Ok(())
    }

    fn seek(&self, _file: u32, frame: i64) -> NativeResult<()> {
        let mut state = self.enter(Op::Seek)?;
        if frame < 0 {
            return Err(OsStatus::INVALID_SEEK);
        }
        state.position = frame;
        Ok(())
    }

    fn tell(&self, _file: u32) -> NativeResult<i64> {
        let state = self.enter(Op::Tell)?;
        Ok(state.position)
    }

    fn dispose(&self, file: u32) -> NativeResult<()> {
        let mut state = self.state.lock();
        *state.calls.entry(Op::Dispose).or_insert(0) += 1;
        state.disposed.push(file);
        // The framework reports an outstanding async failure from dispose
        match state.deferred.take() {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}
