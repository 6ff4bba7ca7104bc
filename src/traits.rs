//! Callback contracts between the decoder core and its host.
//!
//! The original driver threaded an opaque `void *arg` through untyped C
//! function pointers; here the callbacks are traits parameterized over the
//! caller's own types, so their state is type-checked instead of cast.

use crate::Rect;

/// Random-access byte supplier for the compressed stream.
///
/// The decoder names an absolute byte address on every call, so seeking
/// (snapshot restore, segment skipping) is simply the next read at a new
/// address; no separate skip notification exists.
pub trait InputSource {
    /// Fills `dest` with bytes starting at `address` and returns the count
    /// actually supplied. A return shorter than `dest.len()`, including 0,
    /// signals end of stream.
    fn read(&mut self, dest: &mut [u8], address: u32) -> usize;
}

/// Receiver for completed output rectangles.
///
/// Rectangles arrive tightly packed, row-major, in the configured pixel
/// format, clipped to the frame (and to the requested region, if any), in
/// top-to-bottom left-to-right MCU order with no overlaps within a scan.
pub trait PixelSink {
    /// Returns `false` to abort the scan with `CallbackFailed`.
    fn write(&mut self, rect: &Rect, pixels: &[u8]) -> bool;
}

impl InputSource for &[u8] {
    fn read(&mut self, dest: &mut [u8], address: u32) -> usize {
        let start = (address as usize).min(self.len());
        let count = dest.len().min(self.len() - start);
        dest[..count].copy_from_slice(&self[start..start + count]);
        count
    }
}

impl<F> PixelSink for F
where
    F: FnMut(&Rect, &[u8]) -> bool,
{
    fn write(&mut self, rect: &Rect, pixels: &[u8]) -> bool {
        self(rect, pixels)
    }
}
