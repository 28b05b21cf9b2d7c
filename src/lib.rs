//! PRI - Palette-indexed RLE Image Format for Badge Displays

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

use core::{fmt, mem::size_of, slice};
#[cfg(feature = "embedded")]
use embedded_graphics::prelude::Size;

mod decode;
pub use decode::*;

#[cfg(feature = "alloc")]
mod encode;
#[cfg(feature = "alloc")]
pub use encode::*;

pub mod color;
#[cfg(feature = "alloc")]
mod quant;
mod rle;

pub use rle::MAX_RUN_LEN;

#[cfg(test)]
mod test;

pub const PREFERRED_FILE_EXT: &str = "pri";

/// Maximum addressable resolution of the target display.
pub const MAX_WIDTH: u16 = 320;
pub const MAX_HEIGHT: u16 = 240;

/// Maximum number of palette entries a v1 index byte can address.
pub const MAX_PALETTE_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EncodeError {
    /// The source buffer cannot hold `width * height` RGB888 pixels.
    UnsupportedSourceFormat,
    /// The quantizer could not fit the source into the palette budget.
    PaletteOverflow,
    /// Zero-sized or larger than the target display.
    InvalidDimensions,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSourceFormat => f.write_str("unsupported source format"),
            Self::PaletteOverflow => f.write_str("palette overflow"),
            Self::InvalidDimensions => f.write_str("invalid image dimensions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecodeError {
    /// Bad magic, or a version this decoder was not built for.
    UnknownVersion,
    /// Zero-sized or larger than the target display.
    InvalidDimensions,
    /// Palette length outside what a v1 index byte can address.
    PaletteTooLarge,
    /// Byte stream ended inside the header, palette, or a run record.
    TruncatedFile,
    /// Run lengths sum past `width * height`.
    RunOverflow,
    /// Run records exhausted before `width * height` pixels.
    RunUnderflow,
    /// A run referenced an index beyond the palette.
    IndexOutOfRange,
    /// Reserved zero-count run record.
    ZeroLengthRun,
    /// Caller-supplied output slice is too small.
    BufferTooSmall,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVersion => f.write_str("unknown format version"),
            Self::InvalidDimensions => f.write_str("invalid image dimensions"),
            Self::PaletteTooLarge => f.write_str("palette too large"),
            Self::TruncatedFile => f.write_str("truncated file"),
            Self::RunOverflow => f.write_str("run data overflows image"),
            Self::RunUnderflow => f.write_str("run data underflows image"),
            Self::IndexOutOfRange => f.write_str("palette index out of range"),
            Self::ZeroLengthRun => f.write_str("zero-length run record"),
            Self::BufferTooSmall => f.write_str("output buffer too small"),
        }
    }
}

/// On-the-wire file header, frozen for version 1.
///
/// All integers are little-endian. Later RLE variants of the format are not
/// interchangeable with this one; anything but `VER_CURRENT` is rejected
/// outright rather than parsed on a best-effort basis.
#[repr(C, packed)]
pub struct FileHeader {
    magic: [u8; 3],
    version: u8,
    width: u16,
    height: u16,
    palette_len: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageInfo {
    pub width: u16,
    pub height: u16,
}

impl ImageInfo {
    #[inline]
    pub fn width(&self) -> u32 {
        self.width as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height as u32
    }

    #[inline]
    pub fn pixel_count(&self) -> u32 {
        self.width as u32 * self.height as u32
    }
}

#[cfg(feature = "embedded")]
impl From<ImageInfo> for Size {
    #[inline]
    fn from(info: ImageInfo) -> Self {
        Self::new(info.width as u32, info.height as u32)
    }
}

impl FileHeader {
    pub const MINIMAL_SIZE: usize = size_of::<Self>();

    pub const MAGIC: [u8; 3] = *b"PRI";

    pub const VER_CURRENT: u8 = 1;

    #[inline]
    pub fn from_bytes<'a>(blob: &'a [u8]) -> Option<&'a Self> {
        if blob.len() < Self::MINIMAL_SIZE {
            return None;
        }
        Some(unsafe { &*(blob.as_ptr() as *const FileHeader) })
    }

    #[inline]
    pub fn bytes<'a>(&'a self) -> &'a [u8] {
        unsafe { slice::from_raw_parts(self as *const _ as *const u8, size_of::<Self>()) }
    }

    /// Validates the fixed fields in wire order: version tag, dimensions,
    /// palette length.
    pub fn check(&self) -> Result<(), DecodeError> {
        if self.magic != Self::MAGIC || self.version != Self::VER_CURRENT {
            return Err(DecodeError::UnknownVersion);
        }
        let width = self.width.to_le();
        let height = self.height.to_le();
        if width == 0 || height == 0 || width > MAX_WIDTH || height > MAX_HEIGHT {
            return Err(DecodeError::InvalidDimensions);
        }
        let palette_len = self.palette_len.to_le();
        if palette_len == 0 || palette_len as usize > MAX_PALETTE_LEN {
            return Err(DecodeError::PaletteTooLarge);
        }
        Ok(())
    }

    #[inline]
    pub const fn new(width: u32, height: u32, palette_len: usize) -> Option<Self> {
        if width == 0
            || height == 0
            || width > MAX_WIDTH as u32
            || height > MAX_HEIGHT as u32
            || palette_len == 0
            || palette_len > MAX_PALETTE_LEN
        {
            return None;
        }
        Some(Self {
            magic: Self::MAGIC,
            version: Self::VER_CURRENT,
            width: (width as u16).to_le(),
            height: (height as u16).to_le(),
            palette_len: (palette_len as u16).to_le(),
        })
    }

    #[inline]
    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width.to_le(),
            height: self.height.to_le(),
        }
    }

    #[inline]
    pub fn palette_len(&self) -> usize {
        self.palette_len.to_le() as usize
    }
}
