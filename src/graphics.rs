//! CoreGraphics bitmap info helpers
//!
//! `CGBitmapInfo` packs several fields into one u32: the alpha info in the low
//! five bits, float components at bit 8 and the byte order at bits 12-14.
//! [`BitmapInfo`] reads and replaces those fields without touching the rest.

use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// Layout of a bitmap's pixels (`CGBitmapInfo`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitmapInfo(pub u32);

impl BitmapInfo {
    pub const ALPHA_INFO_MASK: Self = Self(0x1F);

    pub const FLOAT_INFO_MASK: Self = Self(0xF00);
    pub const FLOAT_COMPONENTS: Self = Self(1 << 8);

    pub const BYTE_ORDER_MASK: Self = Self(0x7000);
    pub const BYTE_ORDER_DEFAULT: Self = Self(0);
    pub const BYTE_ORDER_16_LITTLE: Self = Self(1 << 12);
    pub const BYTE_ORDER_32_LITTLE: Self = Self(2 << 12);
    pub const BYTE_ORDER_16_BIG: Self = Self(3 << 12);
    pub const BYTE_ORDER_32_BIG: Self = Self(4 << 12);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Bitmap info holding only the given alpha info
    pub const fn from_alpha_info(alpha: ImageAlphaInfo) -> Self {
        Self(alpha as u32)
    }

    /// The alpha info field. Values outside the known set read as `None`.
    pub fn alpha_info(self) -> ImageAlphaInfo {
        ImageAlphaInfo::from_raw(self.0 & Self::ALPHA_INFO_MASK.0).unwrap_or(ImageAlphaInfo::None)
    }

    /// Replace the alpha info field, leaving every other bit as it was
    pub fn set_alpha_info(&mut self, alpha: ImageAlphaInfo) {
        self.remove(Self::ALPHA_INFO_MASK);
        self.insert(Self::from_alpha_info(alpha));
    }

    pub fn with_alpha_info(mut self, alpha: ImageAlphaInfo) -> Self {
        self.set_alpha_info(alpha);
        self
    }

    /// The byte order field
    pub fn byte_order(self) -> Self {
        self & Self::BYTE_ORDER_MASK
    }

    /// Replace the byte order field with one of the `BYTE_ORDER_*` values
    pub fn with_byte_order(mut self, order: Self) -> Self {
        self.remove(Self::BYTE_ORDER_MASK);
        self.insert(order & Self::BYTE_ORDER_MASK);
        self
    }

    /// 16-bit byte order of the host
    pub const fn byte_order_16_host() -> Self {
        if cfg!(target_endian = "big") {
            Self::BYTE_ORDER_16_BIG
        } else {
            Self::BYTE_ORDER_16_LITTLE
        }
    }

    /// 32-bit byte order of the host
    pub const fn byte_order_32_host() -> Self {
        if cfg!(target_endian = "big") {
            Self::BYTE_ORDER_32_BIG
        } else {
            Self::BYTE_ORDER_32_LITTLE
        }
    }
}

impl BitOr for BitmapInfo {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BitmapInfo {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for BitmapInfo {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for BitmapInfo {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl From<ImageAlphaInfo> for BitmapInfo {
    fn from(alpha: ImageAlphaInfo) -> Self {
        Self::from_alpha_info(alpha)
    }
}

/// Presence and position of an alpha channel (`CGImageAlphaInfo`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ImageAlphaInfo {
    #[default]
    None = 0,
    PremultipliedLast = 1,
    PremultipliedFirst = 2,
    Last = 3,
    First = 4,
    NoneSkipLast = 5,
    NoneSkipFirst = 6,
    AlphaOnly = 7,
}

impl ImageAlphaInfo {
    pub const ALL: [ImageAlphaInfo; 8] = [
        Self::None,
        Self::PremultipliedLast,
        Self::PremultipliedFirst,
        Self::Last,
        Self::First,
        Self::NoneSkipLast,
        Self::NoneSkipFirst,
        Self::AlphaOnly,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn has_alpha(self) -> bool {
        !matches!(self, Self::None | Self::NoneSkipLast | Self::NoneSkipFirst)
    }
}
