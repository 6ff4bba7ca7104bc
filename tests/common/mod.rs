//! Shared builders for synthetic baseline JPEG streams.
//!
//! Tests construct minimal but standard-conforming streams: flat
//! quantization tables, the standard DC luminance Huffman table and a
//! one-symbol AC table (every block is DC-only, so its pixel values are
//! exactly predictable: 128 plus the running DC sum).

/// MSB-first bit packer with 0xFF 0x00 byte stuffing and 1-bit padding.
pub struct BitWriter {
    bytes: Vec<u8>,
    cur: u16,
    cur_bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            cur: 0,
            cur_bits: 0,
        }
    }

    pub fn put_bits(&mut self, value: u16, count: u8) {
        for i in (0..count).rev() {
            self.cur = (self.cur << 1) | ((value >> i) & 1);
            self.cur_bits += 1;
            if self.cur_bits == 8 {
                let byte = self.cur as u8;
                self.bytes.push(byte);
                if byte == 0xFF {
                    self.bytes.push(0x00);
                }
                self.cur = 0;
                self.cur_bits = 0;
            }
        }
    }

    pub fn finish(mut self) -> Vec<u8> {
        if self.cur_bits > 0 {
            let pad = 8 - self.cur_bits;
            self.put_bits((1 << pad) - 1, pad);
        }
        self.bytes
    }
}

/// Standard DC luminance code for a magnitude category (K.3.1):
/// "00", "010".."110", then one extra bit per category.
fn dc_code(category: u8) -> (u16, u8) {
    match category {
        0 => (0b00, 2),
        1..=5 => (0b010 + category as u16 - 1, 3),
        _ => {
            let length = category - 2; // 6 -> 4 bits, 11 -> 9 bits
            ((1u16 << length) - 2, length)
        }
    }
}

fn dc_category(diff: i32) -> u8 {
    let magnitude = diff.unsigned_abs();
    (32 - magnitude.leading_zeros()) as u8
}

/// Appends one DC-only block: the DC difference followed by EOB (the AC
/// table encodes EOB as the single bit "0").
pub fn put_dc_block(writer: &mut BitWriter, diff: i32) {
    let category = dc_category(diff);
    let (code, length) = dc_code(category);
    writer.put_bits(code, length);
    if category > 0 {
        let bits = if diff >= 0 {
            diff as u16
        } else {
            (diff + (1 << category) - 1) as u16
        };
        writer.put_bits(bits, category);
    }
    writer.put_bits(0, 1); // EOB
}

fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, marker];
    let length = (payload.len() + 2) as u16;
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// DQT with a flat table: DC step 8, every AC step 16.
pub fn dqt(table_id: u8) -> Vec<u8> {
    let mut payload = vec![table_id];
    payload.push(8);
    payload.extend_from_slice(&[16u8; 63]);
    segment(0xDB, &payload)
}

/// SOF0 frame header. `components` entries are (id, h, v, quant table).
pub fn sof0(width: u16, height: u16, components: &[(u8, u8, u8, u8)]) -> Vec<u8> {
    let mut payload = vec![8];
    payload.extend_from_slice(&height.to_be_bytes());
    payload.extend_from_slice(&width.to_be_bytes());
    payload.push(components.len() as u8);
    for &(id, h, v, quant) in components {
        payload.push(id);
        payload.push((h << 4) | v);
        payload.push(quant);
    }
    segment(0xC0, &payload)
}

pub fn dht(class: u8, table_id: u8, lengths: &[u8; 16], values: &[u8]) -> Vec<u8> {
    let mut payload = vec![(class << 4) | table_id];
    payload.extend_from_slice(lengths);
    payload.extend_from_slice(values);
    segment(0xC4, &payload)
}

/// Standard DC luminance table as table 0.
pub fn dht_std_dc() -> Vec<u8> {
    let lengths = [0u8, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
    let values: Vec<u8> = (0..12).collect();
    dht(0, 0, &lengths, &values)
}

/// One-symbol AC table as table 0: "0" decodes to EOB.
pub fn dht_eob_ac() -> Vec<u8> {
    let mut lengths = [0u8; 16];
    lengths[0] = 1;
    dht(1, 0, &lengths, &[0x00])
}

pub fn dri(interval: u16) -> Vec<u8> {
    segment(0xDD, &interval.to_be_bytes())
}

/// SOS header binding every component to DC/AC tables 0.
pub fn sos(component_ids: &[u8]) -> Vec<u8> {
    let mut payload = vec![component_ids.len() as u8];
    for &id in component_ids {
        payload.push(id);
        payload.push(0x00);
    }
    payload.extend_from_slice(&[0, 63, 0]);
    segment(0xDA, &payload)
}

/// Complete grayscale stream: one DC-only block per MCU, each entry of
/// `dc_diffs` in scan order. The flat pixel value of block `i` is 128 plus
/// the prefix sum of the differences (DC quantization step is 8).
pub fn gray_image(width: u16, height: u16, dc_diffs: &[i32]) -> Vec<u8> {
    let mut stream = vec![0xFF, 0xD8];
    stream.extend(dqt(0));
    stream.extend(sof0(width, height, &[(1, 1, 1, 0)]));
    stream.extend(dht_std_dc());
    stream.extend(dht_eob_ac());
    stream.extend(sos(&[1]));

    let mut writer = BitWriter::new();
    for &diff in dc_diffs {
        put_dc_block(&mut writer, diff);
    }
    stream.extend(writer.finish());
    stream.extend_from_slice(&[0xFF, 0xD9]);
    stream
}

/// Like `gray_image` but with RST markers after every `interval` MCUs.
pub fn gray_image_with_restarts(
    width: u16,
    height: u16,
    dc_diffs: &[i32],
    interval: u16,
) -> Vec<u8> {
    let mut stream = vec![0xFF, 0xD8];
    stream.extend(dqt(0));
    stream.extend(sof0(width, height, &[(1, 1, 1, 0)]));
    stream.extend(dht_std_dc());
    stream.extend(dht_eob_ac());
    stream.extend(dri(interval));
    stream.extend(sos(&[1]));

    let mut restart_index = 0u8;
    for (i, chunk) in dc_diffs.chunks(interval as usize).enumerate() {
        if i > 0 {
            stream.extend_from_slice(&[0xFF, 0xD0 + (restart_index & 7)]);
            restart_index = (restart_index + 1) & 7;
        }
        let mut writer = BitWriter::new();
        for &diff in chunk {
            put_dc_block(&mut writer, diff);
        }
        stream.extend(writer.finish());
    }
    stream.extend_from_slice(&[0xFF, 0xD9]);
    stream
}

/// Three-component stream. Luma sampling `h` x `v`, chroma 1x1; every MCU
/// carries `h * v` luma DC diffs then one Cb and one Cr diff, in the order
/// given by `mcus`.
pub fn color_image(
    width: u16,
    height: u16,
    h: u8,
    v: u8,
    mcus: &[(&[i32], i32, i32)],
) -> Vec<u8> {
    let mut stream = vec![0xFF, 0xD8];
    stream.extend(dqt(0));
    stream.extend(sof0(
        width,
        height,
        &[(1, h, v, 0), (2, 1, 1, 0), (3, 1, 1, 0)],
    ));
    stream.extend(dht_std_dc());
    stream.extend(dht_eob_ac());
    stream.extend(sos(&[1, 2, 3]));

    let mut writer = BitWriter::new();
    for &(luma_diffs, cb_diff, cr_diff) in mcus {
        for &diff in luma_diffs {
            put_dc_block(&mut writer, diff);
        }
        put_dc_block(&mut writer, cb_diff);
        put_dc_block(&mut writer, cr_diff);
    }
    stream.extend(writer.finish());
    stream.extend_from_slice(&[0xFF, 0xD9]);
    stream
}
