//! Dequantization of entropy-decoded coefficient blocks.
//!
//! Quantization tables are de-zig-zagged once at DQT parse time, so both
//! the coefficient block and the table are in natural (row-major) order
//! here. Baseline streams carry 8-bit table entries only.

use crate::constants::{BLOCK_DIM, ZIGZAG_ORDER};

/// Multiplies each coefficient by its quantization step.
pub fn dequantize_block(block: &[i16; BLOCK_DIM], table: &[u8], output: &mut [i32; BLOCK_DIM]) {
    for i in 0..BLOCK_DIM {
        output[i] = block[i] as i32 * table[i] as i32;
    }
}

/// Reorders a DQT segment's zig-zag entries into natural order.
pub fn dezigzag_table(zigzag: &[u8; BLOCK_DIM], natural: &mut [u8]) {
    for (k, &entry) in zigzag.iter().enumerate() {
        natural[ZIGZAG_ORDER[k]] = entry;
    }
}
