pub const MAX_COMPONENT_COUNT: usize = 3;
pub const MAX_TABLE_COUNT: usize = 4;
pub const MAX_SAMPLING_FACTOR: u8 = 2;

// Highest magnitude category a baseline 8-bit DC/AC coefficient can carry
// (ISO/IEC 10918-1, tables F.1 and F.2).
pub const MAX_DC_CATEGORY: u8 = 11;
pub const MAX_AC_CATEGORY: u8 = 10;

pub const BLOCK_SIZE: usize = 8;
pub const BLOCK_DIM: usize = BLOCK_SIZE * BLOCK_SIZE;

// Size of the arena-resident window the byte source refills from the read
// callback. One marker segment header or a handful of entropy bytes per fill.
pub const STREAM_WINDOW_SIZE: usize = 64;

// The size in bytes of the segment length field.
pub const SEGMENT_LENGTH_SIZE: usize = 2;

/// Maps zig-zag scan position to natural (row-major) block position
/// (ISO/IEC 10918-1, figure A.6).
pub const ZIGZAG_ORDER: [usize; BLOCK_DIM] = [
    0, 1, 8, 16, 9, 2, 3, 10,
    17, 24, 32, 25, 18, 11, 4, 5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13, 6, 7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];
