use crate::MAX_PALETTE_LEN;
use heapless::Vec;

#[cfg(feature = "embedded")]
use embedded_graphics::pixelcolor::{
    Bgr555, Bgr565, Bgr666, Bgr888, Rgb555, Rgb565, Rgb666, Rgb888,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB888 space.
    #[inline]
    pub const fn distance_sq(&self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// Ordered set of representable colors for one image.
///
/// Entries are appended at encode time and immutable afterwards; the decoder
/// rebuilds the same table from the file's palette section. Capacity matches
/// the widest index a v1 run record can carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Rgb, MAX_PALETTE_LEN>,
}

impl Palette {
    #[inline]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends an entry, returning its index, or `None` when the index
    /// space is exhausted.
    #[inline]
    pub fn push(&mut self, color: Rgb) -> Option<u8> {
        let index = self.entries.len();
        self.entries.push(color).ok()?;
        Some(index as u8)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.entries.get(index as usize).copied()
    }

    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.entries
    }

    /// Deterministic nearest-color lookup: smallest squared distance wins,
    /// ties broken by the lowest index. The palette must be non-empty.
    pub fn nearest(&self, color: Rgb) -> u8 {
        let mut best = 0usize;
        let mut best_dist = u32::MAX;
        for (index, entry) in self.entries.iter().enumerate() {
            let dist = entry.distance_sq(color);
            if dist < best_dist {
                best = index;
                best_dist = dist;
                if dist == 0 {
                    break;
                }
            }
        }
        best as u8
    }
}

impl FromIterator<Rgb> for Palette {
    fn from_iter<T: IntoIterator<Item = Rgb>>(iter: T) -> Self {
        let mut palette = Palette::new();
        for color in iter {
            if palette.push(color).is_none() {
                break;
            }
        }
        palette
    }
}

macro_rules! from_rgb {
    ($ident:ident, $shift_r:expr, $shift_g:expr, $shift_b:expr) => {
        #[cfg(feature = "embedded")]
        impl From<Rgb> for $ident {
            #[inline]
            fn from(rgb: Rgb) -> Self {
                Self::new(
                    rgb.r.wrapping_shr($shift_r),
                    rgb.g.wrapping_shr($shift_g),
                    rgb.b.wrapping_shr($shift_b),
                )
            }
        }
    };
}

from_rgb!(Rgb555, 3, 3, 3);
from_rgb!(Bgr555, 3, 3, 3);
from_rgb!(Rgb565, 3, 2, 3);
from_rgb!(Bgr565, 3, 2, 3);
from_rgb!(Rgb666, 2, 2, 2);
from_rgb!(Bgr666, 2, 2, 2);
from_rgb!(Rgb888, 0, 0, 0);
from_rgb!(Bgr888, 0, 0, 0);
