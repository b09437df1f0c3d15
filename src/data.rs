//! Byte array and UUID conveniences
//!
//! Helpers for moving plain byte arrays in and out of `bytes` buffers (the
//! Rust side of `NSData` / `NSMutableData`), and for converting between
//! `uuid::Uuid` and CoreFoundation's UUID representation.

use bytes::{Bytes, BytesMut};
use uuid::Uuid;

use crate::error::{Error, OsStatus, Result};
use crate::geometry::Range;

/// Immutable byte buffers built from and read back as byte arrays
pub trait ByteArrayExt: Sized {
    fn from_byte_array(bytes: &[u8]) -> Self;

    /// Copy of the whole contents
    fn to_byte_array(&self) -> Vec<u8>;
}

impl ByteArrayExt for Bytes {
    fn from_byte_array(bytes: &[u8]) -> Self {
        Bytes::copy_from_slice(bytes)
    }

    fn to_byte_array(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl ByteArrayExt for BytesMut {
    fn from_byte_array(bytes: &[u8]) -> Self {
        BytesMut::from(bytes)
    }

    fn to_byte_array(&self) -> Vec<u8> {
        self.to_vec()
    }
}

/// Editing a mutable byte buffer with byte arrays
pub trait MutableByteArrayExt {
    fn append_byte_array(&mut self, bytes: &[u8]);

    /// Replace `range` with `replacement`, growing or shrinking the buffer
    /// as needed. Fails with `PARAM_ERR` if `range` ends past the buffer.
    fn replace_bytes_in_range(&mut self, range: Range, replacement: &[u8]) -> Result<()>;
}

impl MutableByteArrayExt for BytesMut {
    fn append_byte_array(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn replace_bytes_in_range(&mut self, range: Range, replacement: &[u8]) -> Result<()> {
        if range.location > self.len() || range.max() > self.len() {
            return Err(Error::Status(OsStatus::PARAM_ERR));
        }

        if range.length == replacement.len() {
            self[range.as_std()].copy_from_slice(replacement);
            return Ok(());
        }

        let tail = self.split_off(range.max());
        self.truncate(range.location);
        self.extend_from_slice(replacement);
        self.unsplit(tail);
        Ok(())
    }
}

/// Raw bytes of a CoreFoundation UUID (`CFUUIDBytes`), in memory order
pub type CfUuidBytes = [u8; 16];

pub fn uuid_from_cf_bytes(bytes: CfUuidBytes) -> Uuid {
    Uuid::from_bytes(bytes)
}

pub fn uuid_to_cf_bytes(uuid: &Uuid) -> CfUuidBytes {
    *uuid.as_bytes()
}

#[cfg(target_os = "macos")]
mod cf {
    use core_foundation::base::{kCFAllocatorDefault, TCFType};
    use core_foundation::uuid::CFUUID;
    use core_foundation_sys::uuid::{CFUUIDCreateWithBytes, CFUUIDGetUUIDBytes};
    use uuid::Uuid;

    /// Convert a `CFUUID` into a `Uuid`
    pub fn uuid_from_cfuuid(cf_uuid: &CFUUID) -> Uuid {
        let b = unsafe { CFUUIDGetUUIDBytes(cf_uuid.as_concrete_TypeRef()) };
        super::uuid_from_cf_bytes([
            b.byte0, b.byte1, b.byte2, b.byte3, b.byte4, b.byte5, b.byte6, b.byte7, b.byte8,
            b.byte9, b.byte10, b.byte11, b.byte12, b.byte13, b.byte14, b.byte15,
        ])
    }

    /// Create a `CFUUID` holding the same value as `uuid`
    pub fn cfuuid_from_uuid(uuid: &Uuid) -> CFUUID {
        let b = super::uuid_to_cf_bytes(uuid);
        unsafe {
            let uuid_ref = CFUUIDCreateWithBytes(
                kCFAllocatorDefault,
                b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15],
            );
            CFUUID::wrap_under_create_rule(uuid_ref)
        }
    }

}

#[cfg(target_os = "macos")]
pub use cf::{cfuuid_from_uuid, uuid_from_cfuuid};
