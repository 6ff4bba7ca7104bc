//! Entropy decoding of the scan: per-block Huffman decode with DC
//! prediction, zig-zag AC runs, and the cursor state that must survive
//! across blocks (and inside snapshots) because the bitstream is strictly
//! sequential.

use crate::bit_reader::ByteSource;
use crate::constants::{
    BLOCK_DIM, MAX_AC_CATEGORY, MAX_COMPONENT_COUNT, MAX_DC_CATEGORY, ZIGZAG_ORDER,
};
use crate::error::DecodeError;
use crate::huffman::HuffmanTable;
use crate::traits::InputSource;

/// Live decode position within a scan. Copied verbatim into and out of
/// snapshots together with the bit cursor's byte/bit position.
#[derive(Debug, Clone, Copy)]
pub struct ScanCursor {
    pub dc_predictors: [i32; MAX_COMPONENT_COUNT],
    pub mcu_row: u16,
    pub mcu_col: u16,
    /// MCUs left before the next RSTm marker is due; unused when the
    /// restart interval is zero.
    pub restart_countdown: u16,
    pub restart_index: u8,
}

impl ScanCursor {
    pub fn start_of_scan(restart_interval: u16) -> Self {
        Self {
            dc_predictors: [0; MAX_COMPONENT_COUNT],
            mcu_row: 0,
            mcu_col: 0,
            restart_countdown: restart_interval,
            restart_index: 0,
        }
    }
}

/// Sign extension of magnitude bits per their category
/// (ISO/IEC 10918-1, F.2.2.1).
pub fn extend(bits: u32, category: u8) -> i32 {
    if category == 0 {
        return 0;
    }
    let threshold = 1i32 << (category - 1);
    if (bits as i32) >= threshold {
        bits as i32
    } else {
        bits as i32 - (1i32 << category) + 1
    }
}

/// Decodes one 8x8 coefficient block in natural order, updating the
/// component's DC predictor.
pub fn decode_block<I: InputSource>(
    source: &mut ByteSource<'_, I>,
    dc_table: &HuffmanTable<'_>,
    ac_table: &HuffmanTable<'_>,
    predictor: &mut i32,
) -> Result<[i16; BLOCK_DIM], DecodeError> {
    let mut block = [0i16; BLOCK_DIM];

    let category = dc_table.decode(source)?;
    if category > MAX_DC_CATEGORY {
        return Err(DecodeError::InvalidEntropyCode);
    }
    let diff = extend(source.read_bits(category)?, category);
    *predictor += diff;
    block[0] = *predictor as i16;

    let mut k = 1usize;
    while k < BLOCK_DIM {
        let symbol = ac_table.decode(source)?;
        let run = (symbol >> 4) as usize;
        let category = symbol & 0x0F;
        if category == 0 {
            if run == 15 {
                k += 16; // ZRL: sixteen zero coefficients
                if k > BLOCK_DIM {
                    return Err(DecodeError::InvalidEntropyCode);
                }
                continue;
            }
            break; // EOB
        }
        k += run;
        if k >= BLOCK_DIM || category > MAX_AC_CATEGORY {
            return Err(DecodeError::InvalidEntropyCode);
        }
        block[ZIGZAG_ORDER[k]] = extend(source.read_bits(category)?, category) as i16;
        k += 1;
    }

    Ok(block)
}
