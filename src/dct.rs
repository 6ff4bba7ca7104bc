//! Fixed-point inverse DCT for 8x8 blocks.
//!
//! Separable two-pass integer transform with 13-bit scaled constants and a
//! DC-only shortcut on the column pass. Output samples are level-shifted by
//! +128 and clamped to [0, 255]. Integer arithmetic keeps the result
//! bit-stable across runs, which the resume and region equivalence
//! guarantees rely on.

use crate::constants::{BLOCK_DIM, BLOCK_SIZE};

const CONST_BITS: u32 = 13;
const PASS1_BITS: u32 = 2;

const FIX_0_298631336: i64 = 2446;
const FIX_0_390180644: i64 = 3196;
const FIX_0_541196100: i64 = 4433;
const FIX_0_765366865: i64 = 6270;
const FIX_0_899976223: i64 = 7373;
const FIX_1_175875602: i64 = 9633;
const FIX_1_501321110: i64 = 12299;
const FIX_1_847759065: i64 = 15137;
const FIX_1_961570560: i64 = 16069;
const FIX_2_053119869: i64 = 16819;
const FIX_2_562915447: i64 = 20995;
const FIX_3_072711026: i64 = 25172;

#[inline]
fn descale(value: i64, bits: u32) -> i64 {
    (value + (1 << (bits - 1))) >> bits
}

#[inline]
fn clamp_sample(value: i64) -> u8 {
    (value + 128).clamp(0, 255) as u8
}

/// Transforms one dequantized coefficient block (natural order) into
/// spatial samples, written row-major into `output[..64]`.
pub fn idct_8x8(coeffs: &[i32; BLOCK_DIM], output: &mut [u8]) {
    debug_assert!(output.len() >= BLOCK_DIM);
    let mut ws = [0i64; BLOCK_DIM];

    // Pass 1: columns, keeping PASS1_BITS of extra precision.
    for c in 0..BLOCK_SIZE {
        let col = |r: usize| coeffs[r * BLOCK_SIZE + c] as i64;

        if (1..BLOCK_SIZE).all(|r| col(r) == 0) {
            let dc = col(0) << PASS1_BITS;
            for r in 0..BLOCK_SIZE {
                ws[r * BLOCK_SIZE + c] = dc;
            }
            continue;
        }

        // Even part.
        let z2 = col(2);
        let z3 = col(6);
        let z1 = (z2 + z3) * FIX_0_541196100;
        let etmp2 = z1 - z3 * FIX_1_847759065;
        let etmp3 = z1 + z2 * FIX_0_765366865;

        let z2 = col(0);
        let z3 = col(4);
        let etmp0 = (z2 + z3) << CONST_BITS;
        let etmp1 = (z2 - z3) << CONST_BITS;

        let tmp10 = etmp0 + etmp3;
        let tmp13 = etmp0 - etmp3;
        let tmp11 = etmp1 + etmp2;
        let tmp12 = etmp1 - etmp2;

        // Odd part.
        let mut tmp0 = col(7);
        let mut tmp1 = col(5);
        let mut tmp2 = col(3);
        let mut tmp3 = col(1);
        let mut z1 = tmp0 + tmp3;
        let mut z2 = tmp1 + tmp2;
        let mut z3 = tmp0 + tmp2;
        let mut z4 = tmp1 + tmp3;
        let z5 = (z3 + z4) * FIX_1_175875602;

        tmp0 *= FIX_0_298631336;
        tmp1 *= FIX_2_053119869;
        tmp2 *= FIX_3_072711026;
        tmp3 *= FIX_1_501321110;
        z1 *= -FIX_0_899976223;
        z2 *= -FIX_2_562915447;
        z3 = z3 * -FIX_1_961570560 + z5;
        z4 = z4 * -FIX_0_390180644 + z5;

        tmp0 += z1 + z3;
        tmp1 += z2 + z4;
        tmp2 += z2 + z3;
        tmp3 += z1 + z4;

        let shift = CONST_BITS - PASS1_BITS;
        ws[c] = descale(tmp10 + tmp3, shift);
        ws[7 * BLOCK_SIZE + c] = descale(tmp10 - tmp3, shift);
        ws[BLOCK_SIZE + c] = descale(tmp11 + tmp2, shift);
        ws[6 * BLOCK_SIZE + c] = descale(tmp11 - tmp2, shift);
        ws[2 * BLOCK_SIZE + c] = descale(tmp12 + tmp1, shift);
        ws[5 * BLOCK_SIZE + c] = descale(tmp12 - tmp1, shift);
        ws[3 * BLOCK_SIZE + c] = descale(tmp13 + tmp0, shift);
        ws[4 * BLOCK_SIZE + c] = descale(tmp13 - tmp0, shift);
    }

    // Pass 2: rows, final descale and level shift.
    for r in 0..BLOCK_SIZE {
        let row = &ws[r * BLOCK_SIZE..r * BLOCK_SIZE + BLOCK_SIZE];

        // Even part.
        let z2 = row[2];
        let z3 = row[6];
        let z1 = (z2 + z3) * FIX_0_541196100;
        let etmp2 = z1 - z3 * FIX_1_847759065;
        let etmp3 = z1 + z2 * FIX_0_765366865;

        let etmp0 = (row[0] + row[4]) << CONST_BITS;
        let etmp1 = (row[0] - row[4]) << CONST_BITS;

        let tmp10 = etmp0 + etmp3;
        let tmp13 = etmp0 - etmp3;
        let tmp11 = etmp1 + etmp2;
        let tmp12 = etmp1 - etmp2;

        // Odd part.
        let mut tmp0 = row[7];
        let mut tmp1 = row[5];
        let mut tmp2 = row[3];
        let mut tmp3 = row[1];
        let mut z1 = tmp0 + tmp3;
        let mut z2 = tmp1 + tmp2;
        let mut z3 = tmp0 + tmp2;
        let mut z4 = tmp1 + tmp3;
        let z5 = (z3 + z4) * FIX_1_175875602;

        tmp0 *= FIX_0_298631336;
        tmp1 *= FIX_2_053119869;
        tmp2 *= FIX_3_072711026;
        tmp3 *= FIX_1_501321110;
        z1 *= -FIX_0_899976223;
        z2 *= -FIX_2_562915447;
        z3 = z3 * -FIX_1_961570560 + z5;
        z4 = z4 * -FIX_0_390180644 + z5;

        tmp0 += z1 + z3;
        tmp1 += z2 + z4;
        tmp2 += z2 + z3;
        tmp3 += z1 + z4;

        let shift = CONST_BITS + PASS1_BITS + 3;
        let out = &mut output[r * BLOCK_SIZE..r * BLOCK_SIZE + BLOCK_SIZE];
        out[0] = clamp_sample(descale(tmp10 + tmp3, shift));
        out[7] = clamp_sample(descale(tmp10 - tmp3, shift));
        out[1] = clamp_sample(descale(tmp11 + tmp2, shift));
        out[6] = clamp_sample(descale(tmp11 - tmp2, shift));
        out[2] = clamp_sample(descale(tmp12 + tmp1, shift));
        out[5] = clamp_sample(descale(tmp12 - tmp1, shift));
        out[3] = clamp_sample(descale(tmp13 + tmp0, shift));
        out[4] = clamp_sample(descale(tmp13 - tmp0, shift));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Direct-form reference transform.
    fn reference_idct(coeffs: &[i32; BLOCK_DIM]) -> [f64; BLOCK_DIM] {
        let mut out = [0.0f64; BLOCK_DIM];
        for x in 0..8 {
            for y in 0..8 {
                let mut sum = 0.0f64;
                for u in 0..8 {
                    for v in 0..8 {
                        let cu = if u == 0 { 1.0 / 2.0f64.sqrt() } else { 1.0 };
                        let cv = if v == 0 { 1.0 / 2.0f64.sqrt() } else { 1.0 };
                        let cos_x = ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos();
                        let cos_y = ((2 * y + 1) as f64 * v as f64 * PI / 16.0).cos();
                        sum += cu * cv * coeffs[u * 8 + v] as f64 * cos_x * cos_y;
                    }
                }
                out[x * 8 + y] = 0.25 * sum;
            }
        }
        out
    }

    #[test]
    fn dc_only_block_is_exact() {
        let mut coeffs = [0i32; BLOCK_DIM];
        coeffs[0] = 56; // flat value 56/8 = 7 above mid-gray
        let mut output = [0u8; BLOCK_DIM];
        idct_8x8(&coeffs, &mut output);
        assert!(output.iter().all(|&s| s == 135));

        coeffs[0] = -1024;
        idct_8x8(&coeffs, &mut output);
        assert!(output.iter().all(|&s| s == 0));

        coeffs[0] = 1020;
        idct_8x8(&coeffs, &mut output);
        assert!(output.iter().all(|&s| s == 255));
    }

    #[test]
    fn matches_reference_within_one_step() {
        let mut coeffs = [0i32; BLOCK_DIM];
        coeffs[0] = 240;
        coeffs[1] = -96;
        coeffs[8] = 64;
        coeffs[9] = 33;
        coeffs[18] = -50;
        coeffs[34] = 17;
        coeffs[63] = -8;

        let mut output = [0u8; BLOCK_DIM];
        idct_8x8(&coeffs, &mut output);
        let reference = reference_idct(&coeffs);

        for i in 0..BLOCK_DIM {
            let expected = (reference[i] + 128.0).clamp(0.0, 255.0);
            let diff = (output[i] as f64 - expected).abs();
            assert!(diff <= 1.0, "sample {i}: {} vs {expected}", output[i]);
        }
    }
}
