use crate::{color::*, rle::RunReader, *};
use core::marker::PhantomData;

#[cfg(feature = "embedded")]
use embedded_graphics::{prelude::*, primitives::Rectangle};

/// Indices expanded per streaming step: one scanline at device width, so a
/// full decode touches O(palette + one chunk) memory however large the image.
pub const CHUNK_LEN: usize = MAX_WIDTH as usize;

/// Validated view over a PRI blob.
///
/// Construction reads the header and palette; pixel data stays in the blob
/// and is expanded run by run on demand. `T` is the color the embedded draw
/// path converts into and is unused otherwise.
pub struct Decoder<'a, T = ()> {
    blob: &'a [u8],
    info: ImageInfo,
    palette: Palette,
    runs_at: usize,
    _phantom: PhantomData<T>,
}

impl<'a, T> Decoder<'a, T> {
    /// Validates the header, then loads the palette. Anything after those
    /// sections is left untouched until pixels are requested.
    pub fn new(blob: &'a [u8]) -> Result<Self, DecodeError> {
        let header = FileHeader::from_bytes(blob).ok_or(DecodeError::TruncatedFile)?;
        header.check()?;
        let info = header.info();
        let palette_len = header.palette_len();

        let palette_end = FileHeader::MINIMAL_SIZE + palette_len * 3;
        let entries = blob
            .get(FileHeader::MINIMAL_SIZE..palette_end)
            .ok_or(DecodeError::TruncatedFile)?;
        let palette = entries
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
            .collect();

        Ok(Self {
            blob,
            info,
            palette,
            runs_at: palette_end,
            _phantom: PhantomData,
        })
    }

    #[inline]
    pub fn info(&self) -> ImageInfo {
        self.info
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    fn run_reader(&self) -> RunReader<'a> {
        RunReader::new(
            &self.blob[self.runs_at..],
            self.info.pixel_count(),
            self.palette.len(),
        )
    }

    /// Starts a resumable streaming decode. Each call on the returned stream
    /// expands the next slice of the raster; a cooperative caller can do
    /// other work between calls without losing position.
    #[inline]
    pub fn pixel_stream(&self) -> PixelStream<'_> {
        PixelStream {
            runs: self.run_reader(),
            palette: &self.palette,
        }
    }

    /// Decodes the whole image in one forward pass, handing each pixel to
    /// `plot` as `(x, y, color)` offset by `(left, top)`. This is the badge
    /// draw entry point: `plot` writes into the caller's framebuffer, which
    /// this crate never owns. On error the pixels already plotted remain.
    pub fn draw<F>(&self, left: i32, top: i32, mut plot: F) -> Result<(), DecodeError>
    where
        F: FnMut(i32, i32, Rgb),
    {
        let width = self.info.width();
        let mut runs = self.run_reader();
        let mut pos = 0u32;
        while let Some((index, len)) = runs.next_span()? {
            let color = self
                .palette
                .get(index)
                .ok_or(DecodeError::IndexOutOfRange)?;
            for _ in 0..len {
                plot(left + (pos % width) as i32, top + (pos / width) as i32, color);
                pos += 1;
            }
        }
        Ok(())
    }

    /// Expands the full image as RGB888 into `output`, one scanline-sized
    /// chunk at a time.
    pub fn decode_to_slice(&self, output: &mut [u8]) -> Result<(), DecodeError> {
        let needed = self.info.pixel_count() as usize * 3;
        if output.len() < needed {
            return Err(DecodeError::BufferTooSmall);
        }
        let mut stream = self.pixel_stream();
        let mut chunk = [0u8; CHUNK_LEN];
        let mut base = 0usize;
        loop {
            let n = stream.next_indices(&mut chunk)?;
            if n == 0 {
                break;
            }
            for &index in &chunk[..n] {
                let rgb = self
                    .palette
                    .get(index)
                    .ok_or(DecodeError::IndexOutOfRange)?;
                output[base] = rgb.r;
                output[base + 1] = rgb.g;
                output[base + 2] = rgb.b;
                base += 3;
            }
        }
        Ok(())
    }

    #[cfg(feature = "alloc")]
    pub fn decode(&self) -> Result<alloc::vec::Vec<u8>, DecodeError> {
        let vec_size = self.info.pixel_count() as usize * 3;
        let mut vec = alloc::vec::Vec::new();
        vec.resize(vec_size, 0);
        self.decode_to_slice(vec.as_mut()).map(|_| vec)
    }
}

/// Resumable chunked expansion of the pixel stream.
///
/// Progress is plain struct state, not call-stack state, so "give me the
/// next chunk" is an ordinary method call at any point in a rendering loop.
pub struct PixelStream<'a> {
    runs: RunReader<'a>,
    palette: &'a Palette,
}

impl PixelStream<'_> {
    /// Expands up to `out.len()` palette indices, returning how many were
    /// written; `Ok(0)` signals the end of the image.
    #[inline]
    pub fn next_indices(&mut self, out: &mut [u8]) -> Result<usize, DecodeError> {
        self.runs.fill(out)
    }

    /// Like [`Self::next_indices`] but resolved through the palette.
    pub fn next_pixels(&mut self, out: &mut [Rgb]) -> Result<usize, DecodeError> {
        let mut chunk = [0u8; CHUNK_LEN];
        let mut filled = 0usize;
        while filled < out.len() {
            let want = (out.len() - filled).min(CHUNK_LEN);
            let n = self.runs.fill(&mut chunk[..want])?;
            if n == 0 {
                break;
            }
            for (slot, &index) in out[filled..filled + n].iter_mut().zip(&chunk[..n]) {
                *slot = self
                    .palette
                    .get(index)
                    .ok_or(DecodeError::IndexOutOfRange)?;
            }
            filled += n;
        }
        Ok(filled)
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.runs.is_done()
    }
}

#[cfg(feature = "embedded")]
impl<T> OriginDimensions for Decoder<'_, T> {
    #[inline]
    fn size(&self) -> Size {
        self.info().into()
    }
}

#[cfg(feature = "embedded")]
impl<T: PixelColor + From<Rgb>> ImageDrawable for Decoder<'_, T> {
    type Color = T;

    fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let width = self.info().width();
        let mut runs = self.run_reader();
        let mut pos = 0u32;
        loop {
            // A malformed tail aborts this draw only; whatever was already
            // plotted stays on the target.
            let (index, len) = match runs.next_span() {
                Ok(Some(span)) => span,
                Ok(None) | Err(_) => break,
            };
            let Some(rgb) = self.palette.get(index) else {
                break;
            };
            let color: T = rgb.into();
            let mut len = len as u32;
            while len > 0 {
                let x = pos % width;
                let y = pos / width;
                let seg = len.min(width - x);
                target.fill_solid(
                    &Rectangle::new(Point::new(x as i32, y as i32), Size::new(seg, 1)),
                    color,
                )?;
                pos += seg;
                len -= seg;
            }
        }
        Ok(())
    }

    fn draw_sub_image<D>(&self, target: &mut D, area: &Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        ImageDrawable::draw(self, &mut target.translated(-area.top_left).clipped(area))
    }
}
