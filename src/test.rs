use crate::color::{Palette, Rgb};
use crate::{rle, *};

/// Handcrafts a v1 file so framing tests do not depend on the encoder.
fn build_file(width: u16, height: u16, palette: &[(u8, u8, u8)], runs: &[(u8, u8)]) -> Vec<u8> {
    let mut v = vec![b'P', b'R', b'I', FileHeader::VER_CURRENT];
    v.extend_from_slice(&width.to_le_bytes());
    v.extend_from_slice(&height.to_le_bytes());
    v.extend_from_slice(&(palette.len() as u16).to_le_bytes());
    for &(r, g, b) in palette {
        v.extend([r, g, b]);
    }
    for &(count, index) in runs {
        v.extend([count, index]);
    }
    v
}

fn decode_err(blob: &[u8]) -> DecodeError {
    let decoder = match Decoder::<()>::new(blob) {
        Ok(v) => v,
        Err(err) => return err,
    };
    let mut out = vec![0u8; decoder.info().pixel_count() as usize * 3];
    decoder
        .decode_to_slice(&mut out)
        .expect_err("decode unexpectedly succeeded")
}

fn decoded_indices(blob: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let decoder = Decoder::<()>::new(blob)?;
    let mut out = vec![0u8; decoder.info().pixel_count() as usize];
    let mut stream = decoder.pixel_stream();
    let mut filled = 0;
    loop {
        let n = stream.next_indices(&mut out[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    assert_eq!(filled, out.len());
    assert!(stream.is_done());
    Ok(out)
}

const RED: (u8, u8, u8) = (0xFF, 0x00, 0x00);
const BLUE: (u8, u8, u8) = (0x00, 0x00, 0xFF);

/// `A A A B / B B B B` with palette `[A, B]`: one merged run across the row
/// boundary, `(3,A),(5,B)`.
fn tiny_file() -> Vec<u8> {
    build_file(4, 2, &[RED, BLUE], &[(3, 0), (5, 1)])
}

#[test]
fn header_wire_layout() {
    assert_eq!(FileHeader::MINIMAL_SIZE, 10);
    let header = FileHeader::new(4, 2, 2).unwrap();
    assert_eq!(
        header.bytes(),
        [b'P', b'R', b'I', 1, 4, 0, 2, 0, 2, 0].as_slice()
    );

    assert!(FileHeader::new(0, 2, 2).is_none());
    assert!(FileHeader::new(4, 0, 2).is_none());
    assert!(FileHeader::new(MAX_WIDTH as u32 + 1, 2, 2).is_none());
    assert!(FileHeader::new(4, MAX_HEIGHT as u32 + 1, 2).is_none());
    assert!(FileHeader::new(4, 2, 0).is_none());
    assert!(FileHeader::new(4, 2, MAX_PALETTE_LEN + 1).is_none());
}

#[test]
fn tiny_scenario_decodes() {
    let blob = tiny_file();
    let decoder = Decoder::<()>::new(&blob).unwrap();
    assert_eq!(decoder.info().width(), 4);
    assert_eq!(decoder.info().height(), 2);
    assert_eq!(decoder.palette().len(), 2);
    assert_eq!(decoder.palette().get(0), Some(Rgb::new(0xFF, 0, 0)));
    assert_eq!(decoder.palette().get(1), Some(Rgb::new(0, 0, 0xFF)));

    let indices = decoded_indices(&blob).unwrap();
    assert_eq!(indices, [0, 0, 0, 1, 1, 1, 1, 1]);
}

#[cfg(feature = "alloc")]
#[test]
fn tiny_scenario_encodes() {
    let a = [0xFFu8, 0, 0];
    let b = [0u8, 0, 0xFF];
    let mut data = Vec::new();
    for px in [a, a, a, b, b, b, b, b] {
        data.extend_from_slice(&px);
    }

    let encoded = Encoder::encode(&data, 4, 2).unwrap();
    assert_eq!(encoded, tiny_file());
}

#[test]
fn run_split_at_max_length() {
    // A single color repeated 3*M + 7 times must become exactly four
    // records: three of M and one of 7.
    let indices = vec![5u8; 3 * MAX_RUN_LEN + 7];
    let mut records = Vec::new();
    rle::encode_runs(&indices, |count, index| records.push((count, index)));
    assert_eq!(
        records,
        [(255, 5), (255, 5), (255, 5), (7, 5)]
    );

    let mut bytes = Vec::new();
    for (count, index) in records {
        bytes.extend([count, index]);
    }
    let mut reader = rle::RunReader::new(&bytes, indices.len() as u32, 6);
    let mut out = vec![0u8; indices.len()];
    let mut filled = 0;
    loop {
        let n = reader.fill(&mut out[filled..]).unwrap();
        if n == 0 {
            break;
        }
        filled += n;
    }
    assert_eq!(out, indices);
}

#[test]
fn run_merging_is_minimal() {
    let mut records = Vec::new();
    rle::encode_runs(&[1, 1, 2, 2, 2, 1], |count, index| {
        records.push((count, index))
    });
    assert_eq!(records, [(2, 1), (3, 2), (1, 1)]);

    records.clear();
    rle::encode_runs(&[], |count, index| records.push((count, index)));
    assert!(records.is_empty());
}

#[test]
fn truncation_at_every_byte() {
    let blob = tiny_file();
    let palette_end = FileHeader::MINIMAL_SIZE + 2 * 3;
    for cut in 0..blob.len() {
        let err = decode_err(&blob[..cut]);
        if cut < palette_end {
            assert_eq!(err, DecodeError::TruncatedFile, "cut at {}", cut);
        } else if (cut - palette_end) % rle::RUN_RECORD_SIZE == 0 {
            // A clean record boundary looks like a short run list.
            assert_eq!(err, DecodeError::RunUnderflow, "cut at {}", cut);
        } else {
            assert_eq!(err, DecodeError::TruncatedFile, "cut at {}", cut);
        }
    }
}

#[test]
fn foreign_versions_are_rejected() {
    // A later RLE variant...
    let mut blob = tiny_file();
    blob[3] = FileHeader::VER_CURRENT + 1;
    assert_eq!(decode_err(&blob), DecodeError::UnknownVersion);

    // ...the headerless ancestral format (palette bytes first)...
    let mut blob = tiny_file();
    blob[3] = 0;
    assert_eq!(decode_err(&blob), DecodeError::UnknownVersion);

    // ...and anything without the magic.
    let mut blob = tiny_file();
    blob[0] = b'Q';
    assert_eq!(decode_err(&blob), DecodeError::UnknownVersion);
}

#[test]
fn dimension_limits() {
    let mut blob = build_file(4, 2, &[RED], &[(8, 0)]);
    blob[4..6].copy_from_slice(&0u16.to_le_bytes());
    assert_eq!(decode_err(&blob), DecodeError::InvalidDimensions);

    let mut blob = build_file(4, 2, &[RED], &[(8, 0)]);
    blob[4..6].copy_from_slice(&(MAX_WIDTH + 1).to_le_bytes());
    assert_eq!(decode_err(&blob), DecodeError::InvalidDimensions);

    let mut blob = build_file(4, 2, &[RED], &[(8, 0)]);
    blob[6..8].copy_from_slice(&(MAX_HEIGHT + 1).to_le_bytes());
    assert_eq!(decode_err(&blob), DecodeError::InvalidDimensions);
}

#[test]
fn palette_length_limits() {
    let mut blob = tiny_file();
    blob[8..10].copy_from_slice(&0u16.to_le_bytes());
    assert_eq!(decode_err(&blob), DecodeError::PaletteTooLarge);

    let mut blob = tiny_file();
    blob[8..10].copy_from_slice(&(MAX_PALETTE_LEN as u16 + 1).to_le_bytes());
    assert_eq!(decode_err(&blob), DecodeError::PaletteTooLarge);
}

#[test]
fn run_sum_must_match_pixel_count() {
    // One pixel short.
    let blob = build_file(4, 2, &[RED, BLUE], &[(3, 0), (4, 1)]);
    assert_eq!(decode_err(&blob), DecodeError::RunUnderflow);

    // One pixel over.
    let blob = build_file(4, 2, &[RED, BLUE], &[(3, 0), (6, 1)]);
    assert_eq!(decode_err(&blob), DecodeError::RunOverflow);

    // Exact sum, then a dangling record.
    let blob = build_file(4, 2, &[RED, BLUE], &[(3, 0), (5, 1), (1, 0)]);
    assert_eq!(decode_err(&blob), DecodeError::RunOverflow);
}

#[test]
fn out_of_range_index_is_rejected() {
    let blob = build_file(4, 2, &[RED, BLUE], &[(3, 0), (5, 2)]);
    assert_eq!(decode_err(&blob), DecodeError::IndexOutOfRange);
}

#[test]
fn reserved_zero_count_is_rejected() {
    // Count zero introduced literal spans in the ancestral format; v1 must
    // not guess at it.
    let blob = build_file(4, 2, &[RED, BLUE], &[(0, 1), (8, 0)]);
    assert_eq!(decode_err(&blob), DecodeError::ZeroLengthRun);
}

#[test]
fn output_buffer_is_checked() {
    let blob = tiny_file();
    let decoder = Decoder::<()>::new(&blob).unwrap();
    let mut out = [0u8; 8 * 3 - 1];
    assert_eq!(
        decoder.decode_to_slice(&mut out),
        Err(DecodeError::BufferTooSmall)
    );
}

#[test]
fn chunked_decode_matches_full_decode() {
    let blob = build_file(
        6,
        3,
        &[RED, BLUE, (0, 0xFF, 0)],
        &[(5, 0), (1, 2), (7, 1), (4, 2), (1, 0)],
    );
    let full = decoded_indices(&blob).unwrap();

    let decoder = Decoder::<()>::new(&blob).unwrap();
    // Resume in awkward chunk sizes that straddle run boundaries.
    for chunk_len in [1usize, 2, 3, 5, 7] {
        let mut stream = decoder.pixel_stream();
        let mut chunked = Vec::new();
        let mut buf = vec![0u8; chunk_len];
        loop {
            let n = stream.next_indices(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            chunked.extend_from_slice(&buf[..n]);
        }
        assert_eq!(chunked, full, "chunk size {}", chunk_len);
        assert!(stream.is_done());
    }
}

#[test]
fn pixel_stream_resolves_palette() {
    let blob = tiny_file();
    let decoder = Decoder::<()>::new(&blob).unwrap();
    let mut stream = decoder.pixel_stream();
    let mut out = [Rgb::new(0, 0, 0); 8];
    assert_eq!(stream.next_pixels(&mut out).unwrap(), 8);
    assert_eq!(out[0], Rgb::new(0xFF, 0, 0));
    assert_eq!(out[2], Rgb::new(0xFF, 0, 0));
    assert_eq!(out[3], Rgb::new(0, 0, 0xFF));
    assert_eq!(out[7], Rgb::new(0, 0, 0xFF));
    assert_eq!(stream.next_pixels(&mut out).unwrap(), 0);
}

#[test]
fn draw_plots_at_offset() {
    let blob = tiny_file();
    let decoder = Decoder::<()>::new(&blob).unwrap();
    let mut plotted = Vec::new();
    decoder
        .draw(10, 20, |x, y, color| plotted.push((x, y, color)))
        .unwrap();

    assert_eq!(plotted.len(), 8);
    assert_eq!(plotted[0], (10, 20, Rgb::new(0xFF, 0, 0)));
    assert_eq!(plotted[3], (13, 20, Rgb::new(0, 0, 0xFF)));
    // Raster order: the merged run wraps onto the second row.
    assert_eq!(plotted[4], (10, 21, Rgb::new(0, 0, 0xFF)));
    assert_eq!(plotted[7], (13, 21, Rgb::new(0, 0, 0xFF)));
}

#[test]
fn draw_aborts_on_bad_data_after_partial_plot() {
    let blob = build_file(4, 2, &[RED, BLUE], &[(3, 0), (5, 7)]);
    let decoder = Decoder::<()>::new(&blob).unwrap();
    let mut plotted = 0;
    let result = decoder.draw(0, 0, |_, _, _| plotted += 1);
    assert_eq!(result, Err(DecodeError::IndexOutOfRange));
    // The first run already reached the framebuffer and stays there.
    assert_eq!(plotted, 3);
}

#[test]
fn nearest_color_is_deterministic() {
    let mut palette = Palette::new();
    palette.push(Rgb::new(0, 0, 0)).unwrap();
    palette.push(Rgb::new(255, 255, 255)).unwrap();
    palette.push(Rgb::new(200, 0, 0)).unwrap();

    assert_eq!(palette.nearest(Rgb::new(10, 10, 10)), 0);
    assert_eq!(palette.nearest(Rgb::new(250, 250, 250)), 1);
    assert_eq!(palette.nearest(Rgb::new(180, 20, 20)), 2);

    // Duplicate entries: the lowest index wins.
    let mut palette = Palette::new();
    palette.push(Rgb::new(9, 9, 9)).unwrap();
    palette.push(Rgb::new(9, 9, 9)).unwrap();
    assert_eq!(palette.nearest(Rgb::new(9, 9, 9)), 0);
}

#[cfg(feature = "alloc")]
#[test]
fn roundtrip_is_lossless_within_palette_budget() {
    // 16 distinct colors over a 16x4 raster: the exact-palette path, so the
    // decode must match the source byte for byte.
    let width = 16u32;
    let height = 4u32;
    let mut data = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let c = ((x / 5) + y * 4) as u8;
            data.extend_from_slice(&[c * 16, 255 - c * 16, c]);
        }
    }

    let encoded = Encoder::encode(&data, width, height).unwrap();
    let decoder = Decoder::<()>::new(&encoded).unwrap();
    assert_eq!(decoder.decode().unwrap(), data);
}

#[cfg(feature = "alloc")]
#[test]
fn roundtrip_full_screen_single_color() {
    let width = MAX_WIDTH as u32;
    let height = MAX_HEIGHT as u32;
    let data = vec![0x42u8; (width * height * 3) as usize];

    let encoded = Encoder::encode(&data, width, height).unwrap();
    // 76800 pixels of one color: ceil(76800 / 255) records.
    let records = (width as usize * height as usize).div_ceil(MAX_RUN_LEN);
    assert_eq!(
        encoded.len(),
        FileHeader::MINIMAL_SIZE + 3 + records * rle::RUN_RECORD_SIZE
    );

    let decoder = Decoder::<()>::new(&encoded).unwrap();
    assert_eq!(decoder.decode().unwrap(), data);
}

#[cfg(feature = "alloc")]
#[test]
fn quantizer_reduces_rich_sources_deterministically() {
    // 400 distinct colors force the median-cut path.
    let width = 20u32;
    let height = 20u32;
    let mut data = Vec::new();
    for i in 0..(width * height) {
        data.extend_from_slice(&[(i & 0xFF) as u8, ((i >> 8) * 37) as u8, 200]);
    }

    let encoded = Encoder::encode(&data, width, height).unwrap();
    let decoder = Decoder::<()>::new(&encoded).unwrap();
    assert!(decoder.palette().len() <= MAX_PALETTE_LEN);
    assert!(decoder.palette().len() > 1);
    decoder.decode().unwrap();

    // Same input, same bytes.
    let again = Encoder::encode(&data, width, height).unwrap();
    assert_eq!(encoded, again);
}

#[cfg(feature = "alloc")]
#[test]
fn encoder_guards_input() {
    let data = vec![0u8; 4 * 2 * 3];
    assert_eq!(
        Encoder::encode(&data, 0, 2),
        Err(EncodeError::InvalidDimensions)
    );
    assert_eq!(
        Encoder::encode(&data, MAX_WIDTH as u32 + 1, 2),
        Err(EncodeError::InvalidDimensions)
    );
    assert_eq!(
        Encoder::encode(&data[..data.len() - 1], 4, 2),
        Err(EncodeError::UnsupportedSourceFormat)
    );
}
