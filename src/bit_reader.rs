//! Byte source and bit-level cursor over the read callback.
//!
//! Header parsing uses the sequential byte reads; the entropy decoder uses
//! the bit cursor, which strips 0xFF 0x00 stuffing, stops at markers and
//! can report its exact position as a (byte address, consumed bits) pair.
//! The cursor advances one stream byte at a time, so that position is
//! well-defined even when stuffing bytes sit inside the decoded run; a
//! snapshot restore simply re-reads from the recorded address.

use crate::error::DecodeError;
use crate::jpeg_marker_code::{
    JPEG_MARKER_START_BYTE, JPEG_RESTART_MARKER_BASE, JpegMarkerCode,
};
use crate::traits::InputSource;

pub struct ByteSource<'a, I: InputSource> {
    input: I,
    window: &'a mut [u8],
    window_addr: u32,
    window_len: usize,
    window_pos: usize,

    // Entropy bit cursor.
    cur: u8,
    cur_bits: u8,
    cur_addr: u32,
    /// Prefetched data byte (stuffing already removed) and its address.
    ahead: Option<(u8, u32)>,
    /// Marker hit while fetching data bytes: code and address of its 0xFF.
    pending_marker: Option<(u8, u32)>,
}

impl<'a, I: InputSource> ByteSource<'a, I> {
    pub fn new(input: I, window: &'a mut [u8]) -> Self {
        Self {
            input,
            window,
            window_addr: 0,
            window_len: 0,
            window_pos: 0,
            cur: 0,
            cur_bits: 0,
            cur_addr: 0,
            ahead: None,
            pending_marker: None,
        }
    }

    /// Stream address of the next raw byte the sequential reader delivers.
    pub fn address(&self) -> u32 {
        self.window_addr + self.window_pos as u32
    }

    fn fill_window(&mut self) -> Result<(), DecodeError> {
        let addr = self.address();
        let count = self.input.read(self.window, addr);
        if count == 0 {
            return Err(DecodeError::TruncatedInput);
        }
        self.window_addr = addr;
        self.window_len = count;
        self.window_pos = 0;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        if self.window_pos >= self.window_len {
            self.fill_window()?;
        }
        let value = self.window[self.window_pos];
        self.window_pos += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b1 = self.read_u8()? as u16;
        let b2 = self.read_u8()? as u16;
        Ok((b1 << 8) | b2)
    }

    /// Repositions the sequential reader and resets all bit-cursor state.
    pub fn seek(&mut self, address: u32) {
        let window_end = self.window_addr + self.window_len as u32;
        if address >= self.window_addr && address < window_end {
            self.window_pos = (address - self.window_addr) as usize;
        } else {
            self.window_addr = address;
            self.window_len = 0;
            self.window_pos = 0;
        }
        self.cur_bits = 0;
        self.ahead = None;
        self.pending_marker = None;
    }

    pub fn skip(&mut self, count: u32) {
        self.seek(self.address() + count);
    }

    /// Fetches the next entropy data byte, removing stuffing. Returns `None`
    /// once a marker is reached (the marker stays pending until consumed).
    ///
    /// A stream that ends right after a 0xFF leaves the cursor on that
    /// 0xFF, so a retry reports the same truncation at the same address.
    fn fetch(&mut self) -> Result<Option<(u8, u32)>, DecodeError> {
        if self.pending_marker.is_some() {
            return Ok(None);
        }
        let addr = self.address();
        let byte = self.read_u8()?;
        if byte != JPEG_MARKER_START_BYTE {
            return Ok(Some((byte, addr)));
        }
        let next = match self.read_u8() {
            Ok(next) => next,
            Err(error) => {
                // The 0xFF came out of the still-valid window.
                self.window_pos -= 1;
                return Err(error);
            }
        };
        if next == 0x00 {
            Ok(Some((0xFF, addr)))
        } else {
            self.pending_marker = Some((next, addr));
            Ok(None)
        }
    }

    fn marker_interrupt(&self) -> DecodeError {
        match self.pending_marker {
            Some((code, _)) if code == JpegMarkerCode::EndOfImage as u8 => {
                DecodeError::TruncatedInput
            }
            _ => DecodeError::InvalidEntropyCode,
        }
    }

    fn load_cur(&mut self) -> Result<(), DecodeError> {
        if let Some((byte, addr)) = self.ahead.take() {
            self.cur = byte;
            self.cur_addr = addr;
            self.cur_bits = 8;
            return Ok(());
        }
        match self.fetch()? {
            Some((byte, addr)) => {
                self.cur = byte;
                self.cur_addr = addr;
                self.cur_bits = 8;
                Ok(())
            }
            None => Err(self.marker_interrupt()),
        }
    }

    pub fn read_bit(&mut self) -> Result<u32, DecodeError> {
        if self.cur_bits == 0 {
            self.load_cur()?;
        }
        self.cur_bits -= 1;
        Ok(((self.cur >> self.cur_bits) & 1) as u32)
    }

    /// Reads up to 16 bits, MSB first.
    pub fn read_bits(&mut self, count: u8) -> Result<u32, DecodeError> {
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()?;
        }
        Ok(value)
    }

    /// Discards the remaining bits of the current byte.
    pub fn align_to_byte(&mut self) {
        self.cur_bits = 0;
    }

    /// Position of the next unconsumed bit: the address of the stream byte
    /// holding it and how many of that byte's bits are already consumed.
    pub fn bit_position(&self) -> (u32, u8) {
        if self.cur_bits > 0 {
            (self.cur_addr, 8 - self.cur_bits)
        } else if let Some((_, addr)) = self.ahead {
            (addr, 0)
        } else if let Some((_, addr)) = self.pending_marker {
            (addr, 0)
        } else {
            (self.address(), 0)
        }
    }

    /// Restores a position previously captured with `bit_position`.
    pub fn seek_bits(&mut self, address: u32, bit_offset: u8) -> Result<(), DecodeError> {
        if bit_offset >= 8 {
            return Err(DecodeError::InvalidArgument);
        }
        self.seek(address);
        if bit_offset > 0 {
            match self.fetch()? {
                Some((byte, addr)) => {
                    self.cur = byte;
                    self.cur_addr = addr;
                    self.cur_bits = 8 - bit_offset;
                }
                None => return Err(self.marker_interrupt()),
            }
        }
        Ok(())
    }

    /// Consumes the RSTm marker expected at a restart boundary and verifies
    /// its modulo-8 sequence index.
    pub fn expect_restart(&mut self, index: u8) -> Result<(), DecodeError> {
        self.align_to_byte();
        let expected = JPEG_RESTART_MARKER_BASE + (index & 7);
        let code = if let Some((code, _)) = self.pending_marker.take() {
            code
        } else {
            if self.ahead.is_some() {
                // Entropy data where the marker should be.
                return Err(DecodeError::RestartMarkerNotFound);
            }
            if self.read_u8()? != JPEG_MARKER_START_BYTE {
                return Err(DecodeError::RestartMarkerNotFound);
            }
            let mut code = self.read_u8()?;
            // 0xFF fill bytes ahead of a marker are legal.
            while code == JPEG_MARKER_START_BYTE {
                code = self.read_u8()?;
            }
            code
        };
        if code != expected {
            return Err(DecodeError::RestartMarkerNotFound);
        }
        Ok(())
    }

    /// Peeks up to 8 bits (zero-padded) for the flat Huffman probe, along
    /// with the number of real bits available before the next marker. A
    /// short stream only shortens the probe; `fetch` leaves the cursor
    /// unmoved on truncation, and the canonical walk reports the error
    /// when the bits are actually consumed.
    #[cfg(feature = "fast-huffman")]
    pub fn show_bits8(&mut self) -> Result<(u8, u8), DecodeError> {
        let mut bits = if self.cur_bits > 0 {
            (self.cur & ((1u16 << self.cur_bits) - 1) as u8) as u16
        } else {
            0
        };
        let mut avail = self.cur_bits;
        if avail < 8 {
            if self.ahead.is_none() && self.pending_marker.is_none() {
                self.ahead = self.fetch().unwrap_or(None);
            }
            if let Some((byte, _)) = self.ahead {
                bits = (bits << 8) | byte as u16;
                avail += 8;
            }
        }
        let value = if avail >= 8 {
            (bits >> (avail - 8)) as u8
        } else {
            ((bits << (8 - avail)) & 0xFF) as u8
        };
        Ok((value, avail.min(8)))
    }

    #[cfg(feature = "fast-huffman")]
    pub fn skip_bits(&mut self, count: u8) -> Result<(), DecodeError> {
        for _ in 0..count {
            self.read_bit()?;
        }
        Ok(())
    }
}
