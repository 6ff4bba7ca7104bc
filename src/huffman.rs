//! Huffman table construction and symbol decoding for baseline JPEG.
//!
//! Tables are built from DHT segments into arena storage. The default
//! representation is the compact canonical form (code-length walk, one bit
//! per step). With the `fast-huffman` feature a flat 256-entry lookup is
//! carved per table as well: codes of up to 8 bits decode with a single
//! probe, longer codes fall back to the canonical walk.

use crate::arena::Arena;
use crate::bit_reader::ByteSource;
use crate::error::DecodeError;
use crate::traits::InputSource;

#[cfg(feature = "fast-huffman")]
const LOOKUP_BITS: u8 = 8;

pub struct HuffmanTable<'a> {
    min_code: [i32; 16],
    max_code: [i32; 16],
    val_ptr: [i32; 16],
    values: &'a [u8],
    /// 256 (symbol, code length) pairs; length 0 marks codes longer than 8 bits.
    #[cfg(feature = "fast-huffman")]
    lookup: &'a [u8],
}

impl<'a> HuffmanTable<'a> {
    /// Builds decode structures from DHT code-length counts and the
    /// arena-resident symbol values (already in code order).
    pub fn from_dht(
        lengths: &[u8; 16],
        values: &'a [u8],
        arena: &mut Arena<'a>,
    ) -> Result<Self, DecodeError> {
        let mut min_code = [0i32; 16];
        let mut max_code = [-1i32; 16];
        let mut val_ptr = [0i32; 16];

        let mut code = 0u32;
        let mut val_idx = 0usize;
        for i in 0..16 {
            let count = lengths[i] as usize;
            if count > 0 {
                val_ptr[i] = val_idx as i32;
                min_code[i] = code as i32;
                code += count as u32;
                val_idx += count;
                // A canonical code may not overflow its length.
                if code > (1u32 << (i + 1)) {
                    return Err(DecodeError::MalformedHeader);
                }
                max_code[i] = code as i32 - 1;
            }
            code <<= 1;
        }
        if val_idx != values.len() {
            return Err(DecodeError::MalformedHeader);
        }

        #[cfg(feature = "fast-huffman")]
        let lookup = Self::build_lookup(lengths, values, arena)?;
        #[cfg(not(feature = "fast-huffman"))]
        let _ = arena;

        Ok(Self {
            min_code,
            max_code,
            val_ptr,
            values,
            #[cfg(feature = "fast-huffman")]
            lookup,
        })
    }

    #[cfg(feature = "fast-huffman")]
    fn build_lookup(
        lengths: &[u8; 16],
        values: &[u8],
        arena: &mut Arena<'a>,
    ) -> Result<&'a [u8], DecodeError> {
        let lookup = arena.reserve((1usize << LOOKUP_BITS) * 2)?;
        let mut code = 0u32;
        let mut val_idx = 0usize;
        for i in 0..LOOKUP_BITS as usize {
            let length = (i + 1) as u8;
            for _ in 0..lengths[i] {
                let prefix = (code << (LOOKUP_BITS as usize - i - 1)) as usize;
                for suffix in 0..1usize << (LOOKUP_BITS as usize - i - 1) {
                    lookup[(prefix | suffix) * 2] = values[val_idx];
                    lookup[(prefix | suffix) * 2 + 1] = length;
                }
                code += 1;
                val_idx += 1;
            }
            code <<= 1;
        }
        Ok(lookup)
    }

    /// Decodes the next Huffman symbol from the bit cursor.
    pub fn decode<I: InputSource>(
        &self,
        source: &mut ByteSource<'_, I>,
    ) -> Result<u8, DecodeError> {
        #[cfg(feature = "fast-huffman")]
        {
            let (bits, avail) = source.show_bits8()?;
            let length = self.lookup[bits as usize * 2 + 1];
            if length != 0 && length <= avail {
                source.skip_bits(length)?;
                return Ok(self.lookup[bits as usize * 2]);
            }
        }
        self.decode_canonical(source)
    }

    fn decode_canonical<I: InputSource>(
        &self,
        source: &mut ByteSource<'_, I>,
    ) -> Result<u8, DecodeError> {
        let mut code = 0i32;
        for i in 0..16 {
            code = (code << 1) | source.read_bit()? as i32;
            if code <= self.max_code[i] {
                let idx = self.val_ptr[i] + (code - self.min_code[i]);
                return Ok(self.values[idx as usize]);
            }
        }
        Err(DecodeError::InvalidEntropyCode)
    }
}

/// Standard JPEG DC luminance code-length counts (ISO/IEC 10918-1, K.3.1).
pub const STD_LUMINANCE_DC_LENGTHS: [u8; 16] =
    [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];

/// Standard JPEG DC luminance symbol values (ISO/IEC 10918-1, K.3.1).
pub const STD_LUMINANCE_DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
