//! AudioToolbox ExtAudioFile backend for macOS
//!
//! Uses coreaudio-sys for direct access to the ExtAudioFile C API. Each
//! method is one native call; a non-zero `OSStatus` becomes `Err`.
//!
//! This file is only compiled on macOS via #[cfg(target_os = "macos")]

use std::ffi::c_void;
use std::mem;
use std::path::Path;
use std::ptr;

use core_foundation::base::TCFType;
use core_foundation::url::CFURL;
use coreaudio_sys::{
    AudioBufferList, AudioChannelLayout, AudioStreamBasicDescription, Boolean,
    ExtAudioFileCreateWithURL, ExtAudioFileDispose, ExtAudioFileGetProperty,
    ExtAudioFileGetPropertyInfo, ExtAudioFileOpenURL, ExtAudioFileRef, ExtAudioFileSeek,
    ExtAudioFileSetProperty, ExtAudioFileTell, ExtAudioFileWrite, ExtAudioFileWriteAsync,
};

use crate::audio::backend::{ExtAudioFileApi, NativeResult};
use crate::audio::types::*;
use crate::error::OsStatus;

/// ExtAudioFile API of the running system
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreAudioFileApi;

fn check(status: i32) -> NativeResult<()> {
    OsStatus(status).check()
}

fn file_url(path: &Path) -> NativeResult<CFURL> {
    CFURL::from_path(path, false).ok_or(OsStatus::PARAM_ERR)
}

/// Native `AudioBufferList` built over borrowed sample data
///
/// Storage is a run of `AudioBuffer`s; the list header (u32 count plus
/// padding) fits in the first slot, so `n + 1` slots hold `n` buffers.
struct BufferList {
    storage: Vec<coreaudio_sys::AudioBuffer>,
}

impl BufferList {
    fn new(buffers: &[AudioBuffer<'_>]) -> Self {
        let empty = coreaudio_sys::AudioBuffer {
            mNumberChannels: 0,
            mDataByteSize: 0,
            mData: ptr::null_mut(),
        };
        let mut storage = vec![empty; buffers.len() + 1];
        let list = storage.as_mut_ptr() as *mut AudioBufferList;

        unsafe {
            (*list).mNumberBuffers = buffers.len() as u32;
            let slots = (*list).mBuffers.as_mut_ptr();
            for (i, buffer) in buffers.iter().enumerate() {
                *slots.add(i) = coreaudio_sys::AudioBuffer {
                    mNumberChannels: buffer.channels,
                    mDataByteSize: buffer.data.len() as u32,
                    // The framework only reads from write buffers
                    mData: buffer.data.as_ptr() as *mut c_void,
                };
            }
        }

        Self { storage }
    }

    fn as_ptr(&self) -> *const AudioBufferList {
        self.storage.as_ptr() as *const AudioBufferList
    }
}

impl ExtAudioFileApi for CoreAudioFileApi {
    type Handle = ExtAudioFileRef;

    fn open_url(&self, path: &Path) -> NativeResult<ExtAudioFileRef> {
        let url = file_url(path)?;
        let mut file: ExtAudioFileRef = ptr::null_mut();

        let status = unsafe { ExtAudioFileOpenURL(url.as_concrete_TypeRef() as _, &mut file) };
        check(status)?;
        Ok(file)
    }

    fn create_with_url(
        &self,
        path: &Path,
        file_type: AudioFileType,
        format: &mut StreamDescription,
        channel_layout: Option<&[u8]>,
        flags: AudioFileFlags,
    ) -> NativeResult<ExtAudioFileRef> {
        let url = file_url(path)?;
        let mut file: ExtAudioFileRef = ptr::null_mut();

        // Keep the encoded layout 4-byte aligned for the framework
        let layout_words: Option<Vec<u32>> = channel_layout.map(|bytes| {
            bytes
                .chunks(4)
                .map(|chunk| {
                    let mut word = [0u8; 4];
                    word[..chunk.len()].copy_from_slice(chunk);
                    u32::from_ne_bytes(word)
                })
                .collect()
        });
        let layout_ptr = layout_words
            .as_ref()
            .map_or(ptr::null(), |words| words.as_ptr() as *const AudioChannelLayout);

        let status = unsafe {
            ExtAudioFileCreateWithURL(
                url.as_concrete_TypeRef() as _,
                file_type.code(),
                format as *mut StreamDescription as *const AudioStreamBasicDescription,
                layout_ptr,
                flags.bits(),
                &mut file,
            )
        };
        check(status)?;
        Ok(file)
    }

    fn property_info(&self, file: ExtAudioFileRef, id: PropertyId) -> NativeResult<PropertyInfo> {
        let mut size: u32 = 0;
        let mut writable: Boolean = 0;

        let status =
            unsafe { ExtAudioFileGetPropertyInfo(file, id.code(), &mut size, &mut writable) };
        check(status)?;

        Ok(PropertyInfo {
            size,
            writable: writable != 0,
        })
    }

    fn get_property(
        &self,
        file: ExtAudioFileRef,
        id: PropertyId,
        data: &mut [u8],
    ) -> NativeResult<u32> {
        let mut size = data.len() as u32;

        let status = unsafe {
            ExtAudioFileGetProperty(file, id.code(), &mut size, data.as_mut_ptr() as *mut c_void)
        };
        check(status)?;
        Ok(size)
    }

    fn set_property(&self, file: ExtAudioFileRef, id: PropertyId, data: &[u8]) -> NativeResult<()> {
        let status = unsafe {
            ExtAudioFileSetProperty(
                file,
                id.code(),
                data.len() as u32,
                data.as_ptr() as *const c_void,
            )
        };
        check(status)
    }

    fn write(
        &self,
        file: ExtAudioFileRef,
        frames: u32,
        buffers: &[AudioBuffer<'_>],
    ) -> NativeResult<()> {
        let list = BufferList::new(buffers);
        let status = unsafe { ExtAudioFileWrite(file, frames, list.as_ptr()) };
        check(status)
    }

    fn write_async(
        &self,
        file: ExtAudioFileRef,
        frames: u32,
        buffers: Option<&[AudioBuffer<'_>]>,
    ) -> NativeResult<()> {
        // The framework copies the data before returning
        let list = buffers.map(BufferList::new);
        let list_ptr = list.as_ref().map_or(ptr::null(), BufferList::as_ptr);

        let status = unsafe { ExtAudioFileWriteAsync(file, frames, list_ptr) };
        check(status)
    }

    fn seek(&self, file: ExtAudioFileRef, frame: i64) -> NativeResult<()> {
        check(unsafe { ExtAudioFileSeek(file, frame) })
    }

    fn tell(&self, file: ExtAudioFileRef) -> NativeResult<i64> {
        let mut frame: i64 = 0;
        check(unsafe { ExtAudioFileTell(file, &mut frame) })?;
        Ok(frame)
    }

    fn dispose(&self, file: ExtAudioFileRef) -> NativeResult<()> {
        check(unsafe { ExtAudioFileDispose(file) })
    }
}

// Compile-time layout check against the framework struct
const _: () = assert!(mem::size_of::<StreamDescription>() == mem::size_of::<AudioStreamBasicDescription>());
