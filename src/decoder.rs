//! The public decoder: owns the callbacks, the arena-carved scratch and
//! the scan cursor, and drives header parse, entropy decode, IDCT and
//! pixel emission.
//!
//! Construction parses the full header and sizes every buffer; after that
//! no reservation happens, so `scan` cannot fail with `NotEnoughMemory`.
//! Scans walk whole MCU rows even when a region of interest covers only
//! part of them (the entropy stream is strictly sequential), but pixels
//! are only composed and delivered for the requested region.

use crate::arena::Arena;
use crate::bit_reader::ByteSource;
use crate::color_convert::{PlaneLayout, compose_rect};
use crate::constants::{BLOCK_DIM, MAX_COMPONENT_COUNT, MAX_TABLE_COUNT, STREAM_WINDOW_SIZE};
use crate::dct::idct_8x8;
use crate::error::DecodeError;
use crate::huffman::HuffmanTable;
use crate::jpeg_stream_reader::{Component, JpegStreamReader};
use crate::quantization::dequantize_block;
use crate::scan_decoder::{ScanCursor, decode_block};
use crate::traits::{InputSource, PixelSink};
use crate::{Config, FrameInfo, PixelFormat, Rect, ScanState, Snapshot};

pub struct JpegDecoder<'a, I: InputSource, S: PixelSink> {
    source: ByteSource<'a, I>,
    sink: S,
    format: PixelFormat,

    frame_info: FrameInfo,
    components: [Component; MAX_COMPONENT_COUNT],
    quantization_tables: [Option<&'a [u8]>; MAX_TABLE_COUNT],
    dc_tables: [Option<HuffmanTable<'a>>; MAX_TABLE_COUNT],
    ac_tables: [Option<HuffmanTable<'a>>; MAX_TABLE_COUNT],
    restart_interval: u16,
    scan_start_address: u32,

    planes: [PlaneLayout; MAX_COMPONENT_COUNT],
    hmax: u8,
    vmax: u8,
    mcu_width: u16,
    mcu_height: u16,
    mcus_x: u16,
    mcus_y: u16,

    mcu_samples: &'a mut [u8],
    mcu_pixels: &'a mut [u8],

    cursor: ScanCursor,
    state: ScanState,
    arena_used: usize,
    arena_remaining: usize,
}

impl<'a, I: InputSource, S: PixelSink> JpegDecoder<'a, I, S> {
    /// Parses the stream header and carves all scratch buffers from the
    /// work buffer. After this returns no further memory is needed.
    pub fn new(config: Config<'a, I, S>) -> Result<Self, DecodeError> {
        let Config {
            format,
            source,
            sink,
            work,
        } = config;

        let mut arena = Arena::new(work);
        let window = arena.reserve(STREAM_WINDOW_SIZE)?;
        let mut source = ByteSource::new(source, window);
        let header = JpegStreamReader::new(&mut source, &mut arena).read_header()?;

        let component_count = header.frame_info.component_count as usize;
        let hmax = header.components[0].h_samp_factor;
        let vmax = header.components[0].v_samp_factor;
        let mcu_width = hmax as u16 * 8;
        let mcu_height = vmax as u16 * 8;

        let mut planes = [PlaneLayout::default(); MAX_COMPONENT_COUNT];
        let mut sample_count = 0usize;
        for (plane, component) in planes
            .iter_mut()
            .zip(&header.components[..component_count])
        {
            *plane = PlaneLayout {
                h: component.h_samp_factor,
                v: component.v_samp_factor,
                offset: sample_count,
            };
            sample_count +=
                component.h_samp_factor as usize * component.v_samp_factor as usize * BLOCK_DIM;
        }

        let mcu_samples = arena.reserve(sample_count)?;
        let mcu_pixels = arena.reserve(
            mcu_width as usize * mcu_height as usize * format.bytes_per_pixel(),
        )?;

        Ok(Self {
            source,
            sink,
            format,
            frame_info: header.frame_info,
            components: header.components,
            quantization_tables: header.quantization_tables,
            dc_tables: header.dc_tables,
            ac_tables: header.ac_tables,
            restart_interval: header.restart_interval,
            scan_start_address: header.scan_start_address,
            planes,
            hmax,
            vmax,
            mcu_width,
            mcu_height,
            mcus_x: header.frame_info.width.div_ceil(mcu_width),
            mcus_y: header.frame_info.height.div_ceil(mcu_height),
            mcu_samples,
            mcu_pixels,
            cursor: ScanCursor::start_of_scan(header.restart_interval),
            state: ScanState::Ready,
            arena_used: arena.used(),
            arena_remaining: arena.remaining(),
        })
    }

    pub fn frame_info(&self) -> FrameInfo {
        self.frame_info
    }

    pub fn width(&self) -> u16 {
        self.frame_info.width
    }

    pub fn height(&self) -> u16 {
        self.frame_info.height
    }

    pub fn component_count(&self) -> u8 {
        self.frame_info.component_count
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Work-buffer bytes consumed by the decoder's tables and scratch.
    pub fn arena_used(&self) -> usize {
        self.arena_used
    }

    pub fn arena_remaining(&self) -> usize {
        self.arena_remaining
    }

    /// Captures the current decode position. Only positions at an MCU
    /// boundary are captured, which is where `scan` always stops.
    pub fn snapshot(&self) -> Snapshot {
        let (byte_address, bit_offset) = self.source.bit_position();
        Snapshot {
            byte_address,
            bit_offset,
            dc_predictors: self.cursor.dc_predictors,
            mcu_row: self.cursor.mcu_row,
            mcu_col: self.cursor.mcu_col,
            restart_countdown: self.cursor.restart_countdown,
            restart_index: self.cursor.restart_index,
        }
    }

    /// Decodes the scan, optionally resuming from `snapshot` and clipping
    /// output to `roi`.
    ///
    /// The decode runs through the last MCU row overlapping the region and
    /// stops there, leaving the cursor at the next row boundary so a
    /// subsequent `snapshot` and `scan` pair continues seamlessly. A region
    /// entirely outside the frame decodes nothing and succeeds.
    pub fn scan(
        &mut self,
        snapshot: Option<&Snapshot>,
        roi: Option<Rect>,
    ) -> Result<(), DecodeError> {
        let frame = Rect {
            x: 0,
            y: 0,
            w: self.frame_info.width,
            h: self.frame_info.height,
        };
        let roi = match roi {
            Some(requested) => match requested.intersect(&frame) {
                Some(clipped) => clipped,
                None => return Ok(()),
            },
            None => frame,
        };

        match snapshot {
            Some(snapshot) => {
                if snapshot.bit_offset >= 8
                    || snapshot.mcu_row > self.mcus_y
                    || snapshot.mcu_col >= self.mcus_x
                {
                    return Err(DecodeError::InvalidArgument);
                }
                self.source
                    .seek_bits(snapshot.byte_address, snapshot.bit_offset)?;
                self.cursor = ScanCursor {
                    dc_predictors: snapshot.dc_predictors,
                    mcu_row: snapshot.mcu_row,
                    mcu_col: snapshot.mcu_col,
                    restart_countdown: snapshot.restart_countdown,
                    restart_index: snapshot.restart_index,
                };
            }
            None => {
                self.source.seek(self.scan_start_address);
                self.cursor = ScanCursor::start_of_scan(self.restart_interval);
            }
        }

        self.state = ScanState::Scanning;
        match self.run(&roi) {
            Ok(()) => {
                if self.cursor.mcu_row >= self.mcus_y {
                    self.state = ScanState::Complete;
                }
                Ok(())
            }
            Err(error) => {
                self.state = ScanState::Failed;
                Err(error)
            }
        }
    }

    fn run(&mut self, roi: &Rect) -> Result<(), DecodeError> {
        let last_row = (roi.y + roi.h - 1) / self.mcu_height;
        while self.cursor.mcu_row < self.mcus_y && self.cursor.mcu_row <= last_row {
            self.decode_mcu()?;
            self.emit_mcu(roi)?;
            self.cursor.mcu_col += 1;
            if self.cursor.mcu_col == self.mcus_x {
                self.cursor.mcu_col = 0;
                self.cursor.mcu_row += 1;
            }
        }
        Ok(())
    }

    /// Entropy-decodes, dequantizes and inverse-transforms every block of
    /// the MCU under the cursor into the sample scratch buffer.
    fn decode_mcu(&mut self) -> Result<(), DecodeError> {
        if self.restart_interval > 0 && self.cursor.restart_countdown == 0 {
            self.source.expect_restart(self.cursor.restart_index)?;
            self.cursor.restart_index = (self.cursor.restart_index + 1) & 7;
            self.cursor.dc_predictors = [0; MAX_COMPONENT_COUNT];
            self.cursor.restart_countdown = self.restart_interval;
        }

        let component_count = self.frame_info.component_count as usize;
        for c in 0..component_count {
            let component = &self.components[c];
            let quant = self.quantization_tables[component.quant_table as usize]
                .ok_or(DecodeError::MalformedHeader)?;
            let dc = self.dc_tables[component.dc_table as usize]
                .as_ref()
                .ok_or(DecodeError::MalformedHeader)?;
            let ac = self.ac_tables[component.ac_table as usize]
                .as_ref()
                .ok_or(DecodeError::MalformedHeader)?;

            let blocks = component.h_samp_factor as usize * component.v_samp_factor as usize;
            for b in 0..blocks {
                let block = decode_block(
                    &mut self.source,
                    dc,
                    ac,
                    &mut self.cursor.dc_predictors[c],
                )?;
                let mut coeffs = [0i32; BLOCK_DIM];
                dequantize_block(&block, quant, &mut coeffs);
                let start = self.planes[c].offset + b * BLOCK_DIM;
                idct_8x8(&coeffs, &mut self.mcu_samples[start..start + BLOCK_DIM]);
            }
        }

        if self.restart_interval > 0 {
            self.cursor.restart_countdown -= 1;
        }
        Ok(())
    }

    /// Composes and delivers the visible, region-clipped part of the
    /// decoded MCU. MCUs fully outside the region are decoded but not
    /// emitted.
    fn emit_mcu(&mut self, roi: &Rect) -> Result<(), DecodeError> {
        let origin_x = self.cursor.mcu_col * self.mcu_width;
        let origin_y = self.cursor.mcu_row * self.mcu_height;
        let mcu_rect = Rect {
            x: origin_x,
            y: origin_y,
            w: self.mcu_width,
            h: self.mcu_height,
        };
        let Some(clipped) = mcu_rect.intersect(roi) else {
            return Ok(());
        };

        let component_count = self.frame_info.component_count as usize;
        let written = compose_rect(
            self.mcu_samples,
            &self.planes[..component_count],
            self.hmax,
            self.vmax,
            origin_x,
            origin_y,
            &clipped,
            self.format,
            self.mcu_pixels,
        );
        if !self.sink.write(&clipped, &self.mcu_pixels[..written]) {
            return Err(DecodeError::CallbackFailed);
        }
        Ok(())
    }
}
