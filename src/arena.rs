//! Bump allocation out of the caller-supplied work buffer.
//!
//! Every long-lived structure the decoder needs (stream window, Huffman
//! values, quantization tables, MCU scratch) is carved from this arena at
//! initialization time. Nothing is ever freed or reused within one decoder
//! lifetime, so the work buffer size is a hard memory ceiling: the first
//! reservation that does not fit fails with `NotEnoughMemory`.

use crate::error::DecodeError;

pub struct Arena<'a> {
    free: &'a mut [u8],
    used: usize,
}

impl<'a> Arena<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            free: buffer,
            used: 0,
        }
    }

    /// Carves `len` bytes off the front of the remaining buffer.
    ///
    /// The returned slice is zeroed (the buffer may hold stale caller data)
    /// and lives as long as the work buffer itself.
    pub fn reserve(&mut self, len: usize) -> Result<&'a mut [u8], DecodeError> {
        if len > self.free.len() {
            return Err(DecodeError::NotEnoughMemory);
        }
        let buffer = std::mem::take(&mut self.free);
        let (head, rest) = buffer.split_at_mut(len);
        self.free = rest;
        self.used += len;
        head.fill(0);
        Ok(head)
    }

    /// Bytes consumed so far (the high-water mark; carving never backtracks).
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.free.len()
    }
}
