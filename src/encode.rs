use crate::{quant, rle, *};

pub struct Encoder;

impl Encoder {
    /// Encodes one RGB888 raster into a complete PRI byte stream.
    pub fn encode(
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<alloc::vec::Vec<u8>, EncodeError> {
        let mut vec = alloc::vec::Vec::new();
        Self::encode_to_writer(data, width, height, |v| vec.extend_from_slice(v)).map(|_| vec)
    }

    /// Quantizes `data` (RGB888, raster order) and streams header, palette,
    /// and run records through `writer` in wire order.
    ///
    /// Nothing reaches `writer` until quantization has succeeded, and every
    /// later step is infallible, so a caller that buffers the output never
    /// finalizes a partial artifact.
    pub fn encode_to_writer<F>(
        data: &[u8],
        width: u32,
        height: u32,
        mut writer: F,
    ) -> Result<(), EncodeError>
    where
        F: FnMut(&[u8]),
    {
        if width == 0 || height == 0 || width > MAX_WIDTH as u32 || height > MAX_HEIGHT as u32 {
            return Err(EncodeError::InvalidDimensions);
        }
        let pixel_count = width as usize * height as usize;
        if data.len() < pixel_count * 3 {
            return Err(EncodeError::UnsupportedSourceFormat);
        }

        let (palette, indices) = quant::quantize(data, pixel_count)?;

        let header = FileHeader::new(width, height, palette.len())
            .ok_or(EncodeError::InvalidDimensions)?;
        writer(header.bytes());
        for color in palette.colors() {
            writer(&[color.r, color.g, color.b]);
        }
        rle::encode_runs(&indices, |count, index| writer(&[count, index]));

        Ok(())
    }
}
