//! Run-length codec over the palette-index stream.
//!
//! A run record is two bytes on the wire: a count and a palette index.
//! Counts are 1..=255; zero is reserved (the ancestral format used it to
//! introduce literal spans) and rejected by the v1 decoder. Runs are merged
//! across row boundaries, so one forward pass with no backward seeks
//! reconstructs the whole raster-order index stream.

use crate::DecodeError;

/// Longest run a single v1 record can carry.
pub const MAX_RUN_LEN: usize = 255;

/// Bytes per run record: count, then palette index.
pub(crate) const RUN_RECORD_SIZE: usize = 2;

/// Merges consecutive equal indices and emits `(count, index)` records,
/// splitting any merged run longer than [`MAX_RUN_LEN`] into consecutive
/// records. Decoding the emitted records reproduces `indices` exactly.
pub(crate) fn encode_runs<F>(indices: &[u8], mut emit: F)
where
    F: FnMut(u8, u8),
{
    let mut iter = indices.iter().copied();
    let Some(first) = iter.next() else {
        return;
    };
    let mut current = first;
    let mut count = 1usize;
    for index in iter {
        if index == current {
            count += 1;
        } else {
            emit_split(&mut emit, count, current);
            current = index;
            count = 1;
        }
    }
    emit_split(&mut emit, count, current);
}

#[inline]
fn emit_split<F>(emit: &mut F, mut count: usize, index: u8)
where
    F: FnMut(u8, u8),
{
    while count > MAX_RUN_LEN {
        emit(MAX_RUN_LEN as u8, index);
        count -= MAX_RUN_LEN;
    }
    if count > 0 {
        emit(count as u8, index);
    }
}

/// Streaming run expander.
///
/// Progress lives in this struct, not on the call stack: a cooperative
/// rendering loop can interleave other work between `fill` calls and resume
/// exactly where it left off. At most one run's remainder is held between
/// calls, so peak memory is independent of the image size.
pub(crate) struct RunReader<'a> {
    src: &'a [u8],
    cursor: usize,
    current: u8,
    remaining: usize,
    emitted: u32,
    total: u32,
    palette_len: usize,
}

impl<'a> RunReader<'a> {
    #[inline]
    pub fn new(src: &'a [u8], total: u32, palette_len: usize) -> Self {
        Self {
            src,
            cursor: 0,
            current: 0,
            remaining: 0,
            emitted: 0,
            total,
            palette_len,
        }
    }

    /// True once exactly `total` indices have been handed out.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.remaining == 0 && self.emitted == self.total
    }

    fn next_record(&mut self) -> Result<(), DecodeError> {
        debug_assert!(self.remaining == 0 && self.emitted < self.total);
        if self.cursor >= self.src.len() {
            // Ran out of records with pixels still owed.
            return Err(DecodeError::RunUnderflow);
        }
        if self.cursor + RUN_RECORD_SIZE > self.src.len() {
            return Err(DecodeError::TruncatedFile);
        }
        let count = self.src[self.cursor];
        let index = self.src[self.cursor + 1];
        self.cursor += RUN_RECORD_SIZE;
        if count == 0 {
            return Err(DecodeError::ZeroLengthRun);
        }
        if index as usize >= self.palette_len {
            return Err(DecodeError::IndexOutOfRange);
        }
        if self.emitted + count as u32 > self.total {
            return Err(DecodeError::RunOverflow);
        }
        self.current = index;
        self.remaining = count as usize;
        Ok(())
    }

    // Run-length sums are validated record by record, so the only thing
    // left to catch at the end is records dangling past the final pixel.
    #[inline]
    fn check_tail(&self) -> Result<(), DecodeError> {
        if self.cursor < self.src.len() {
            return Err(DecodeError::RunOverflow);
        }
        Ok(())
    }

    /// Expands up to `out.len()` indices into `out`, returning how many were
    /// written. Returns `Ok(0)` once the stream is complete.
    pub fn fill(&mut self, out: &mut [u8]) -> Result<usize, DecodeError> {
        let mut filled = 0;
        while filled < out.len() {
            if self.remaining == 0 {
                if self.emitted == self.total {
                    break;
                }
                self.next_record()?;
            }
            let take = (out.len() - filled).min(self.remaining);
            out[filled..filled + take].fill(self.current);
            filled += take;
            self.remaining -= take;
            self.emitted += take as u32;
        }
        if self.is_done() {
            self.check_tail()?;
        }
        Ok(filled)
    }

    /// Hands out the rest of the current run as a `(index, length)` span,
    /// fetching the next record as needed. Returns `Ok(None)` at the end of
    /// the stream.
    pub fn next_span(&mut self) -> Result<Option<(u8, usize)>, DecodeError> {
        if self.remaining == 0 {
            if self.emitted == self.total {
                self.check_tail()?;
                return Ok(None);
            }
            self.next_record()?;
        }
        let span = (self.current, self.remaining);
        self.emitted += self.remaining as u32;
        self.remaining = 0;
        if self.is_done() {
            self.check_tail()?;
        }
        Ok(Some(span))
    }
}
