//! Palette reduction for the encoder.
//!
//! Sources that already fit the index space keep their exact colors, in
//! first-seen order. Anything richer is median-cut down to the full palette
//! budget. Both paths are pure lookups over stable orderings, so the same
//! source always produces the same palette and the same index array.

use crate::{
    EncodeError, MAX_PALETTE_LEN,
    color::{Palette, Rgb},
};
use alloc::{collections::BTreeMap, vec::Vec};

#[inline]
fn pack(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

#[inline]
fn unpack(key: u32) -> Rgb {
    Rgb::new((key >> 16) as u8, (key >> 8) as u8, key as u8)
}

/// Maps `pixel_count` RGB888 pixels onto at most [`MAX_PALETTE_LEN`] colors,
/// returning the palette and one index per source pixel.
pub(crate) fn quantize(data: &[u8], pixel_count: usize) -> Result<(Palette, Vec<u8>), EncodeError> {
    if data.len() < pixel_count * 3 {
        return Err(EncodeError::UnsupportedSourceFormat);
    }

    let mut histogram = BTreeMap::new();
    for px in 0..pixel_count {
        let key = pack(data[px * 3], data[px * 3 + 1], data[px * 3 + 2]);
        *histogram.entry(key).or_insert(0u32) += 1;
    }

    let index_of = if histogram.len() <= MAX_PALETTE_LEN {
        None
    } else {
        Some(median_cut(&histogram))
    };

    let mut palette = Palette::new();
    let mut seen = BTreeMap::new();
    let mut indices = Vec::with_capacity(pixel_count);
    for px in 0..pixel_count {
        let key = pack(data[px * 3], data[px * 3 + 1], data[px * 3 + 2]);
        let index = match &index_of {
            Some(map) => {
                let (box_id, entry) = map[&key];
                let box_key = box_id as u32;
                match seen.get(&box_key) {
                    Some(index) => *index,
                    None => {
                        let index = palette.push(entry).ok_or(EncodeError::PaletteOverflow)?;
                        seen.insert(box_key, index);
                        index
                    }
                }
            }
            None => match seen.get(&key) {
                Some(index) => *index,
                None => {
                    let index = palette.push(unpack(key)).ok_or(EncodeError::PaletteOverflow)?;
                    seen.insert(key, index);
                    index
                }
            },
        };
        indices.push(index);
    }

    Ok((palette, indices))
}

/// Classic median cut over the unique-color histogram: repeatedly split the
/// box with the widest channel at its weighted median, then replace each box
/// with its weighted average color. Returns, per source color, the box id
/// and the box's palette entry.
fn median_cut(histogram: &BTreeMap<u32, u32>) -> BTreeMap<u32, (usize, Rgb)> {
    // BTreeMap iteration order keeps the initial box stable.
    let mut boxes: Vec<Vec<(Rgb, u32)>> = Vec::with_capacity(MAX_PALETTE_LEN);
    boxes.push(
        histogram
            .iter()
            .map(|(&key, &count)| (unpack(key), count))
            .collect(),
    );

    while boxes.len() < MAX_PALETTE_LEN {
        let Some((victim, channel)) = widest_box(&boxes) else {
            break;
        };
        let mut entries = core::mem::take(&mut boxes[victim]);
        entries.sort_by_key(|(color, _)| {
            let c = match channel {
                0 => color.r,
                1 => color.g,
                _ => color.b,
            };
            (c, pack(color.r, color.g, color.b))
        });

        let total: u64 = entries.iter().map(|(_, count)| *count as u64).sum();
        let mut acc = 0u64;
        let mut split = 0usize;
        for (i, (_, count)) in entries.iter().enumerate() {
            acc += *count as u64;
            if acc * 2 >= total {
                split = i + 1;
                break;
            }
        }
        // Both halves must keep at least one color.
        let split = split.clamp(1, entries.len() - 1);

        let tail = entries.split_off(split);
        boxes[victim] = entries;
        boxes.push(tail);
    }

    let mut map = BTreeMap::new();
    for (box_id, entries) in boxes.iter().enumerate() {
        let entry = box_average(entries);
        for (color, _) in entries {
            map.insert(pack(color.r, color.g, color.b), (box_id, entry));
        }
    }
    map
}

/// Picks the splittable box with the largest channel spread; ties go to the
/// earliest box and the reddest channel, keeping the cut order stable.
fn widest_box(boxes: &[Vec<(Rgb, u32)>]) -> Option<(usize, u8)> {
    let mut best: Option<(usize, u8, u8)> = None;
    for (box_id, entries) in boxes.iter().enumerate() {
        if entries.len() < 2 {
            continue;
        }
        let mut min = [u8::MAX; 3];
        let mut max = [0u8; 3];
        for (color, _) in entries {
            for (c, value) in [color.r, color.g, color.b].into_iter().enumerate() {
                min[c] = min[c].min(value);
                max[c] = max[c].max(value);
            }
        }
        for channel in 0..3u8 {
            let spread = max[channel as usize] - min[channel as usize];
            if best.map_or(true, |(_, _, s)| spread > s) {
                best = Some((box_id, channel, spread));
            }
        }
    }
    best.map(|(box_id, channel, _)| (box_id, channel))
}

fn box_average(entries: &[(Rgb, u32)]) -> Rgb {
    let mut sum = [0u64; 3];
    let mut total = 0u64;
    for (color, count) in entries {
        let count = *count as u64;
        sum[0] += color.r as u64 * count;
        sum[1] += color.g as u64 * count;
        sum[2] += color.b as u64 * count;
        total += count;
    }
    Rgb::new(
        (sum[0] / total) as u8,
        (sum[1] / total) as u8,
        (sum[2] / total) as u8,
    )
}
