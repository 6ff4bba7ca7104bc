//! Baseline JPEG decoder for memory-constrained targets.
//!
//! The compressed stream is pulled through a caller-supplied byte-range
//! callback, decoded pixels are pushed through a rectangle callback, and
//! every internal buffer is carved from one caller-supplied work buffer at
//! initialization. Scans can be clipped to a region of interest and
//! resumed from a snapshot taken at an MCU-row boundary.

pub mod arena;
pub mod bit_reader;
pub mod color_convert;
pub mod constants;
pub mod dct;
pub mod decoder;
pub mod error;
pub mod huffman;
pub mod jpeg_marker_code;
pub mod jpeg_stream_reader;
pub mod quantization;
pub mod scan_decoder;
pub mod traits;

pub use decoder::JpegDecoder;
pub use error::DecodeError;
pub use traits::{InputSource, PixelSink};

use crate::constants::MAX_COMPONENT_COUNT;

/// Output pixel encodings. 16-bit formats are packed 5-6-5 little-endian;
/// 32-bit formats carry a fixed opaque alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Grayscale,
    Rgb565,
    Bgr565,
    Rgb888,
    Bgr888,
    Rgba8888,
    Bgra8888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Grayscale => 1,
            Self::Rgb565 | Self::Bgr565 => 2,
            Self::Rgb888 | Self::Bgr888 => 3,
            Self::Rgba8888 | Self::Bgra8888 => 4,
        }
    }
}

/// A pixel rectangle: a region-of-interest request, or the bounds of one
/// delivered output block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x as u32 + self.w as u32).min(other.x as u32 + other.w as u32);
        let y2 = (self.y as u32 + self.h as u32).min(other.y as u32 + other.h as u32);
        if (x1 as u32) < x2 && (y1 as u32) < y2 {
            Some(Rect {
                x: x1,
                y: y1,
                w: (x2 - x1 as u32) as u16,
                h: (y2 - y1 as u32) as u16,
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    pub width: u16,
    pub height: u16,
    pub component_count: u8,
}

/// Scan controller states. An instance only exists after a successful
/// header parse, so there is no pre-initialization state to represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Ready,
    Scanning,
    Complete,
    Failed,
}

/// Resumable decode position, captured at an MCU boundary.
///
/// Plain data: callers may store it independently of the decoder, but it
/// is only meaningful against the exact bitstream it was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Stream address of the byte holding the next unconsumed bit.
    pub byte_address: u32,
    /// Bits of that byte already consumed (0..=7).
    pub bit_offset: u8,
    pub dc_predictors: [i32; MAX_COMPONENT_COUNT],
    pub mcu_row: u16,
    pub mcu_col: u16,
    pub restart_countdown: u16,
    pub restart_index: u8,
}

/// Everything the decoder needs from its host, consumed by
/// [`JpegDecoder::new`]. The work buffer is the hard memory ceiling: all
/// internal tables and scratch are carved from it.
pub struct Config<'a, I: InputSource, S: PixelSink> {
    pub format: PixelFormat,
    pub source: I,
    pub sink: S,
    pub work: &'a mut [u8],
}
