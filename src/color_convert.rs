//! Chroma upsampling and color conversion to the output pixel formats.
//!
//! Chroma planes are upsampled by nearest-neighbor replication onto the
//! luma grid. YCbCr to RGB uses the BT.601 coefficients in 16.16 fixed
//! point with round-half-up, so every format packing is exact and
//! reproducible on integer-only targets.

use crate::PixelFormat;
use crate::Rect;
use crate::constants::BLOCK_DIM;

const FIX_1_402: i32 = 91881; // 1.402 * 65536
const FIX_0_344136: i32 = 22554; // 0.344136 * 65536
const FIX_0_714136: i32 = 46802; // 0.714136 * 65536
const FIX_1_772: i32 = 116130; // 1.772 * 65536

/// Where one component's reconstructed samples live inside the MCU
/// scratch buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneLayout {
    pub h: u8,
    pub v: u8,
    pub offset: usize,
}

#[inline]
fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// BT.601 YCbCr to full-range RGB.
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> (u8, u8, u8) {
    let y = y as i32;
    let cb = cb as i32 - 128;
    let cr = cr as i32 - 128;
    let r = y + ((FIX_1_402 * cr + 32768) >> 16);
    let g = y - ((FIX_0_344136 * cb + FIX_0_714136 * cr + 32768) >> 16);
    let b = y + ((FIX_1_772 * cb + 32768) >> 16);
    (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

/// Packs one pixel into `out` and returns the bytes written. 16-bit
/// formats are stored little-endian.
pub fn pack_pixel(format: PixelFormat, r: u8, g: u8, b: u8, out: &mut [u8]) -> usize {
    match format {
        PixelFormat::Grayscale => {
            out[0] = r;
            1
        }
        PixelFormat::Rgb565 => {
            let v = ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3);
            out[..2].copy_from_slice(&v.to_le_bytes());
            2
        }
        PixelFormat::Bgr565 => {
            let v = ((b as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (r as u16 >> 3);
            out[..2].copy_from_slice(&v.to_le_bytes());
            2
        }
        PixelFormat::Rgb888 => {
            out[..3].copy_from_slice(&[r, g, b]);
            3
        }
        PixelFormat::Bgr888 => {
            out[..3].copy_from_slice(&[b, g, r]);
            3
        }
        PixelFormat::Rgba8888 => {
            out[..4].copy_from_slice(&[r, g, b, 0xFF]);
            4
        }
        PixelFormat::Bgra8888 => {
            out[..4].copy_from_slice(&[b, g, r, 0xFF]);
            4
        }
    }
}

#[inline]
fn plane_sample(samples: &[u8], plane: &PlaneLayout, hmax: u8, vmax: u8, dx: usize, dy: usize) -> u8 {
    // Nearest-neighbor: map the luma-grid pixel onto the subsampled plane.
    let sx = dx * plane.h as usize / hmax as usize;
    let sy = dy * plane.v as usize / vmax as usize;
    let block = (sy / 8) * plane.h as usize + sx / 8;
    samples[plane.offset + block * BLOCK_DIM + (sy % 8) * 8 + sx % 8]
}

/// Composes the pixels of `rect` (absolute coordinates, fully inside the
/// MCU at `origin`) tightly packed into `output`. Returns bytes written.
pub fn compose_rect(
    samples: &[u8],
    planes: &[PlaneLayout],
    hmax: u8,
    vmax: u8,
    origin_x: u16,
    origin_y: u16,
    rect: &Rect,
    format: PixelFormat,
    output: &mut [u8],
) -> usize {
    let mut written = 0usize;
    let grayscale_source = planes.len() == 1;

    for y in rect.y..rect.y + rect.h {
        let dy = (y - origin_y) as usize;
        for x in rect.x..rect.x + rect.w {
            let dx = (x - origin_x) as usize;
            let luma = plane_sample(samples, &planes[0], hmax, vmax, dx, dy);
            let (r, g, b) = if grayscale_source || format == PixelFormat::Grayscale {
                (luma, luma, luma)
            } else {
                let cb = plane_sample(samples, &planes[1], hmax, vmax, dx, dy);
                let cr = plane_sample(samples, &planes[2], hmax, vmax, dx, dy);
                ycbcr_to_rgb(luma, cb, cr)
            };
            written += pack_pixel(format, r, g, b, &mut output[written..]);
        }
    }
    written
}
