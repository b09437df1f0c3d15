//! Shared audio file types
//!
//! Plain values mirroring the AudioToolbox structures used by ExtAudioFile.
//! NO platform-specific imports allowed here: the `#[repr(C)]` structs have
//! the same layout as their native counterparts so the macOS backend can hand
//! them to the framework directly.

use std::ffi::c_void;
use std::fmt;
use std::mem;
use std::ops::BitOr;
use std::ptr;

use serde::{Deserialize, Serialize};

/// Build a four-character code from its ASCII form
pub const fn four_cc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// Properties of an extended audio file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyId {
    /// `AudioStreamBasicDescription` of the file's data
    FileDataFormat,
    /// Variable-length `AudioChannelLayout` of the file
    FileChannelLayout,
    /// Format the caller reads and writes in
    ClientDataFormat,
    ClientChannelLayout,
    /// Codec manufacturer used for conversion (u32)
    CodecManufacturer,
    /// `AudioConverterRef`, null when no conversion happens
    AudioConverter,
    /// Underlying `AudioFileID`
    AudioFile,
    FileMaxPacketSize,
    ClientMaxPacketSize,
    /// Length in sample frames of the file data format (i64)
    FileLengthFrames,
    /// Converter configuration as a `CFPropertyListRef`
    ConverterConfig,
    IoBufferSizeBytes,
    /// Pointer to a caller-owned I/O buffer
    IoBuffer,
    /// `AudioFilePacketTableInfo`
    PacketTable,
}

impl PropertyId {
    pub const ALL: [PropertyId; 14] = [
        Self::FileDataFormat,
        Self::FileChannelLayout,
        Self::ClientDataFormat,
        Self::ClientChannelLayout,
        Self::CodecManufacturer,
        Self::AudioConverter,
        Self::AudioFile,
        Self::FileMaxPacketSize,
        Self::ClientMaxPacketSize,
        Self::FileLengthFrames,
        Self::ConverterConfig,
        Self::IoBufferSizeBytes,
        Self::IoBuffer,
        Self::PacketTable,
    ];

    /// Native `ExtAudioFilePropertyID`
    pub const fn code(self) -> u32 {
        match self {
            Self::FileDataFormat => four_cc(b"ffmt"),
            Self::FileChannelLayout => four_cc(b"fclo"),
            Self::ClientDataFormat => four_cc(b"cfmt"),
            Self::ClientChannelLayout => four_cc(b"cclo"),
            Self::CodecManufacturer => four_cc(b"cman"),
            Self::AudioConverter => four_cc(b"acnv"),
            Self::AudioFile => four_cc(b"afil"),
            Self::FileMaxPacketSize => four_cc(b"fmps"),
            Self::ClientMaxPacketSize => four_cc(b"cmps"),
            Self::FileLengthFrames => four_cc(b"#frm"),
            Self::ConverterConfig => four_cc(b"accf"),
            Self::IoBufferSizeBytes => four_cc(b"iobs"),
            Self::IoBuffer => four_cc(b"iobf"),
            Self::PacketTable => four_cc(b"xpti"),
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.code() == code)
    }
}

/// Result of a property size/writability query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyInfo {
    /// Bytes needed to hold the value
    pub size: u32,
    pub writable: bool,
}

/// Fixed-layout values that can be copied to and from a native property buffer.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` (or primitive) plain data for which every
/// bit pattern of `size_of::<Self>()` bytes is a valid value.
pub unsafe trait PropertyData: Copy + 'static {
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: Self is plain data, so all of its bytes may be viewed
        unsafe { std::slice::from_raw_parts(self as *const Self as *const u8, mem::size_of::<Self>()) }
    }

    /// Read a value from the start of `bytes`. Returns None if too short.
    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < mem::size_of::<Self>() {
            return None;
        }
        // SAFETY: length checked above and any bit pattern is valid
        Some(unsafe { ptr::read_unaligned(bytes.as_ptr() as *const Self) })
    }
}

unsafe impl PropertyData for u32 {}
unsafe impl PropertyData for i32 {}
unsafe impl PropertyData for i64 {}
unsafe impl PropertyData for u64 {}
unsafe impl PropertyData for f64 {}
unsafe impl PropertyData for OpaqueRef {}
unsafe impl PropertyData for StreamDescription {}
unsafe impl PropertyData for PacketTableInfo {}

/// Pointer-sized reference to a native object (`AudioConverterRef`,
/// `AudioFileID`, `CFPropertyListRef`, buffer pointers)
///
/// Ownership of the pointee stays with the native framework.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct OpaqueRef(pub *mut c_void);

impl OpaqueRef {
    pub const fn null() -> Self {
        Self(ptr::null_mut())
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

impl Default for OpaqueRef {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for OpaqueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueRef({:p})", self.0)
    }
}

pub const K_AUDIO_FORMAT_LINEAR_PCM: u32 = four_cc(b"lpcm");
pub const K_AUDIO_FORMAT_FLAG_IS_FLOAT: u32 = 1 << 0;
pub const K_AUDIO_FORMAT_FLAG_IS_BIG_ENDIAN: u32 = 1 << 1;
pub const K_AUDIO_FORMAT_FLAG_IS_SIGNED_INTEGER: u32 = 1 << 2;
pub const K_AUDIO_FORMAT_FLAG_IS_PACKED: u32 = 1 << 3;

/// Layout-compatible `AudioStreamBasicDescription`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct StreamDescription {
    pub sample_rate: f64,
    pub format_id: u32,
    pub format_flags: u32,
    pub bytes_per_packet: u32,
    pub frames_per_packet: u32,
    pub bytes_per_frame: u32,
    pub channels_per_frame: u32,
    pub bits_per_channel: u32,
    #[serde(skip)]
    pub reserved: u32,
}

impl StreamDescription {
    /// Interleaved native-endian packed 32-bit float PCM
    pub fn linear_pcm_f32(sample_rate: f64, channels: u32) -> Self {
        Self::packed_pcm(sample_rate, channels, 32, K_AUDIO_FORMAT_FLAG_IS_FLOAT)
    }

    /// Interleaved native-endian packed signed 16-bit PCM
    pub fn linear_pcm_i16(sample_rate: f64, channels: u32) -> Self {
        Self::packed_pcm(
            sample_rate,
            channels,
            16,
            K_AUDIO_FORMAT_FLAG_IS_SIGNED_INTEGER,
        )
    }

    fn packed_pcm(sample_rate: f64, channels: u32, bits: u32, sample_flag: u32) -> Self {
        let endian_flag = if cfg!(target_endian = "big") {
            K_AUDIO_FORMAT_FLAG_IS_BIG_ENDIAN
        } else {
            0
        };
        let bytes_per_frame = bits / 8 * channels;
        Self {
            sample_rate,
            format_id: K_AUDIO_FORMAT_LINEAR_PCM,
            format_flags: sample_flag | K_AUDIO_FORMAT_FLAG_IS_PACKED | endian_flag,
            bytes_per_packet: bytes_per_frame,
            frames_per_packet: 1,
            bytes_per_frame,
            channels_per_frame: channels,
            bits_per_channel: bits,
            reserved: 0,
        }
    }

    pub fn is_linear_pcm(&self) -> bool {
        self.format_id == K_AUDIO_FORMAT_LINEAR_PCM
    }
}

/// Layout-compatible `AudioFilePacketTableInfo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct PacketTableInfo {
    pub number_valid_frames: i64,
    pub priming_frames: i32,
    pub remainder_frames: i32,
}

/// `kAudioChannelLayoutTag_UseChannelDescriptions`
pub const CHANNEL_LAYOUT_TAG_USE_DESCRIPTIONS: u32 = 0;
/// `kAudioChannelLayoutTag_UseChannelBitmap`
pub const CHANNEL_LAYOUT_TAG_USE_BITMAP: u32 = 1 << 16;
pub const CHANNEL_LAYOUT_TAG_MONO: u32 = (100 << 16) | 1;
pub const CHANNEL_LAYOUT_TAG_STEREO: u32 = (101 << 16) | 2;

/// One entry of a channel layout (`AudioChannelDescription`)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelDescription {
    pub label: u32,
    pub flags: u32,
    pub coordinates: [f32; 3],
}

/// Owned form of the variable-length `AudioChannelLayout`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelLayout {
    pub tag: u32,
    pub bitmap: u32,
    pub descriptions: Vec<ChannelDescription>,
}

impl ChannelLayout {
    /// Bytes of the native header (tag, bitmap, description count)
    pub const HEADER_SIZE: usize = 12;
    pub const DESCRIPTION_SIZE: usize = 20;

    pub fn from_tag(tag: u32) -> Self {
        Self {
            tag,
            bitmap: 0,
            descriptions: Vec::new(),
        }
    }

    pub fn mono() -> Self {
        Self::from_tag(CHANNEL_LAYOUT_TAG_MONO)
    }

    pub fn stereo() -> Self {
        Self::from_tag(CHANNEL_LAYOUT_TAG_STEREO)
    }

    /// Size of the native representation
    pub fn byte_size(&self) -> usize {
        Self::HEADER_SIZE + self.descriptions.len() * Self::DESCRIPTION_SIZE
    }

    /// Encode into the native in-memory layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_size());
        out.extend_from_slice(&self.tag.to_ne_bytes());
        out.extend_from_slice(&self.bitmap.to_ne_bytes());
        out.extend_from_slice(&(self.descriptions.len() as u32).to_ne_bytes());
        for desc in &self.descriptions {
            out.extend_from_slice(&desc.label.to_ne_bytes());
            out.extend_from_slice(&desc.flags.to_ne_bytes());
            for coordinate in desc.coordinates {
                out.extend_from_slice(&coordinate.to_ne_bytes());
            }
        }
        out
    }

    /// Decode the native layout. Returns None when `bytes` is shorter than the
    /// header or than the description count it announces.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let word = |offset: usize| -> Option<[u8; 4]> {
            bytes.get(offset..offset + 4)?.try_into().ok()
        };

        let tag = u32::from_ne_bytes(word(0)?);
        let bitmap = u32::from_ne_bytes(word(4)?);
        let count = u32::from_ne_bytes(word(8)?) as usize;

        let needed = count
            .checked_mul(Self::DESCRIPTION_SIZE)?
            .checked_add(Self::HEADER_SIZE)?;
        if bytes.len() < needed {
            return None;
        }

        let descriptions = (0..count)
            .map(|i| {
                let base = Self::HEADER_SIZE + i * Self::DESCRIPTION_SIZE;
                Some(ChannelDescription {
                    label: u32::from_ne_bytes(word(base)?),
                    flags: u32::from_ne_bytes(word(base + 4)?),
                    coordinates: [
                        f32::from_ne_bytes(word(base + 8)?),
                        f32::from_ne_bytes(word(base + 12)?),
                        f32::from_ne_bytes(word(base + 16)?),
                    ],
                })
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            tag,
            bitmap,
            descriptions,
        })
    }

    /// Number of channels implied by the layout tag, if it encodes one
    pub fn channel_count(&self) -> u32 {
        match self.tag {
            CHANNEL_LAYOUT_TAG_USE_DESCRIPTIONS => self.descriptions.len() as u32,
            CHANNEL_LAYOUT_TAG_USE_BITMAP => self.bitmap.count_ones(),
            tag => tag & 0xFFFF,
        }
    }
}

/// Container format of a file (`AudioFileTypeID`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioFileType {
    Aiff,
    Aifc,
    Wave,
    Rf64,
    Caf,
    M4a,
    Mpeg4,
    Mp3,
    AacAdts,
    Flac,
    Other(u32),
}

impl AudioFileType {
    pub fn code(self) -> u32 {
        match self {
            Self::Aiff => four_cc(b"AIFF"),
            Self::Aifc => four_cc(b"AIFC"),
            Self::Wave => four_cc(b"WAVE"),
            Self::Rf64 => four_cc(b"RF64"),
            Self::Caf => four_cc(b"caff"),
            Self::M4a => four_cc(b"m4af"),
            Self::Mpeg4 => four_cc(b"mp4f"),
            Self::Mp3 => four_cc(b"MPG3"),
            Self::AacAdts => four_cc(b"adts"),
            Self::Flac => four_cc(b"flac"),
            Self::Other(code) => code,
        }
    }
}

/// Flags for file creation (`AudioFileFlags`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFileFlags(pub u32);

impl AudioFileFlags {
    pub const NONE: Self = Self(0);
    /// Overwrite an existing file
    pub const ERASE_FILE: Self = Self(1);
    pub const DONT_PAGE_ALIGN_AUDIO_DATA: Self = Self(2);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AudioFileFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Optional arguments of a create call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateOptions {
    /// Channel layout of the new file (None = let the framework decide)
    pub channel_layout: Option<ChannelLayout>,
    pub flags: AudioFileFlags,
}

impl CreateOptions {
    pub fn with_channel_layout(mut self, layout: ChannelLayout) -> Self {
        self.channel_layout = Some(layout);
        self
    }

    pub fn with_flags(mut self, flags: AudioFileFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// One buffer of frames handed to a write call (`AudioBuffer`)
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer<'a> {
    /// Interleaved channels in this buffer
    pub channels: u32,
    pub data: &'a [u8],
}

impl<'a> AudioBuffer<'a> {
    pub fn interleaved(channels: u32, data: &'a [u8]) -> Self {
        Self { channels, data }
    }
}
