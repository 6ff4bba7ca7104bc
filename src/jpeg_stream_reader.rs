//! Marker-segment parser for the stream head.
//!
//! Runs once at initialization: consumes SOI and every table/frame segment
//! up to and including SOS, building arena-resident decoder tables and the
//! frame geometry. Entropy-coded data is never touched here; the parser
//! stops at the first byte after the SOS header and records that address
//! as the scan start.

use crate::FrameInfo;
use crate::arena::Arena;
use crate::bit_reader::ByteSource;
use crate::constants::{
    BLOCK_DIM, MAX_COMPONENT_COUNT, MAX_SAMPLING_FACTOR, MAX_TABLE_COUNT, SEGMENT_LENGTH_SIZE,
};
use crate::error::DecodeError;
use crate::huffman::HuffmanTable;
use crate::jpeg_marker_code::{JPEG_MARKER_START_BYTE, JpegMarkerCode};
use crate::quantization::dezigzag_table;
use crate::traits::InputSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct Component {
    pub id: u8,
    pub h_samp_factor: u8,
    pub v_samp_factor: u8,
    pub quant_table: u8,
    pub dc_table: u8,
    pub ac_table: u8,
}

/// Everything the scan stages need, produced by `read_header`.
pub struct ParsedHeader<'a> {
    pub frame_info: FrameInfo,
    pub components: [Component; MAX_COMPONENT_COUNT],
    pub quantization_tables: [Option<&'a [u8]>; MAX_TABLE_COUNT],
    pub dc_tables: [Option<HuffmanTable<'a>>; MAX_TABLE_COUNT],
    pub ac_tables: [Option<HuffmanTable<'a>>; MAX_TABLE_COUNT],
    pub restart_interval: u16,
    pub scan_start_address: u32,
}

pub struct JpegStreamReader<'s, 'a, I: InputSource> {
    source: &'s mut ByteSource<'a, I>,
    arena: &'s mut Arena<'a>,
    frame_info: FrameInfo,
    components: [Component; MAX_COMPONENT_COUNT],
    quantization_tables: [Option<&'a [u8]>; MAX_TABLE_COUNT],
    dc_tables: [Option<HuffmanTable<'a>>; MAX_TABLE_COUNT],
    ac_tables: [Option<HuffmanTable<'a>>; MAX_TABLE_COUNT],
    restart_interval: u16,
}

impl<'s, 'a, I: InputSource> JpegStreamReader<'s, 'a, I> {
    pub fn new(source: &'s mut ByteSource<'a, I>, arena: &'s mut Arena<'a>) -> Self {
        Self {
            source,
            arena,
            frame_info: FrameInfo::default(),
            components: [Component::default(); MAX_COMPONENT_COUNT],
            quantization_tables: [None; MAX_TABLE_COUNT],
            dc_tables: [const { None }; MAX_TABLE_COUNT],
            ac_tables: [const { None }; MAX_TABLE_COUNT],
            restart_interval: 0,
        }
    }

    pub fn read_header(mut self) -> Result<ParsedHeader<'a>, DecodeError> {
        self.read_start_of_image()?;

        loop {
            let marker = self.read_marker()?;
            match marker {
                JpegMarkerCode::StartOfFrameBaseline => {
                    self.read_sof0_segment()?;
                }
                JpegMarkerCode::StartOfFrameExtendedSequential
                | JpegMarkerCode::StartOfFrameProgressive
                | JpegMarkerCode::StartOfFrameLossless
                | JpegMarkerCode::StartOfFrameDifferentialSequential
                | JpegMarkerCode::StartOfFrameDifferentialProgressive
                | JpegMarkerCode::StartOfFrameDifferentialLossless
                | JpegMarkerCode::StartOfFrameArithmeticSequential
                | JpegMarkerCode::StartOfFrameArithmeticProgressive
                | JpegMarkerCode::StartOfFrameArithmeticLossless
                | JpegMarkerCode::StartOfFrameDifferentialArithmeticSequential
                | JpegMarkerCode::StartOfFrameDifferentialArithmeticProgressive
                | JpegMarkerCode::StartOfFrameDifferentialArithmeticLossless => {
                    return Err(DecodeError::UnsupportedEncoding);
                }
                JpegMarkerCode::DefineQuantizationTable => {
                    self.read_dqt_segment()?;
                }
                JpegMarkerCode::DefineHuffmanTable => {
                    self.read_dht_segment()?;
                }
                JpegMarkerCode::DefineRestartInterval => {
                    self.read_dri_segment()?;
                }
                JpegMarkerCode::StartOfScan => {
                    let scan_start_address = self.read_sos_segment()?;
                    return Ok(ParsedHeader {
                        frame_info: self.frame_info,
                        components: self.components,
                        quantization_tables: self.quantization_tables,
                        dc_tables: self.dc_tables,
                        ac_tables: self.ac_tables,
                        restart_interval: self.restart_interval,
                        scan_start_address,
                    });
                }
                JpegMarkerCode::ApplicationData0
                | JpegMarkerCode::ApplicationData1
                | JpegMarkerCode::ApplicationData2
                | JpegMarkerCode::ApplicationData3
                | JpegMarkerCode::ApplicationData4
                | JpegMarkerCode::ApplicationData5
                | JpegMarkerCode::ApplicationData6
                | JpegMarkerCode::ApplicationData7
                | JpegMarkerCode::ApplicationData8
                | JpegMarkerCode::ApplicationData9
                | JpegMarkerCode::ApplicationData10
                | JpegMarkerCode::ApplicationData11
                | JpegMarkerCode::ApplicationData12
                | JpegMarkerCode::ApplicationData13
                | JpegMarkerCode::ApplicationData14
                | JpegMarkerCode::ApplicationData15
                | JpegMarkerCode::Comment
                | JpegMarkerCode::DefineNumberOfLines => {
                    self.skip_segment()?;
                }
                _ => return Err(DecodeError::MalformedHeader),
            }
        }
    }

    fn read_start_of_image(&mut self) -> Result<(), DecodeError> {
        if self.source.read_u8()? != JPEG_MARKER_START_BYTE {
            return Err(DecodeError::StartOfImageMarkerNotFound);
        }
        if self.source.read_u8()? != JpegMarkerCode::StartOfImage as u8 {
            return Err(DecodeError::StartOfImageMarkerNotFound);
        }
        Ok(())
    }

    fn read_marker(&mut self) -> Result<JpegMarkerCode, DecodeError> {
        if self.source.read_u8()? != JPEG_MARKER_START_BYTE {
            return Err(DecodeError::MalformedHeader);
        }
        let mut code = self.source.read_u8()?;
        // 0xFF fill bytes before a marker code are legal.
        while code == JPEG_MARKER_START_BYTE {
            code = self.source.read_u8()?;
        }
        JpegMarkerCode::try_from(code).map_err(|_| DecodeError::MalformedHeader)
    }

    /// Reads the segment length field and returns the payload byte count.
    fn read_segment_size(&mut self) -> Result<usize, DecodeError> {
        let size = self.source.read_u16()? as usize;
        if size < SEGMENT_LENGTH_SIZE {
            return Err(DecodeError::InvalidMarkerSegmentSize);
        }
        Ok(size - SEGMENT_LENGTH_SIZE)
    }

    fn skip_segment(&mut self) -> Result<(), DecodeError> {
        let payload = self.read_segment_size()?;
        self.source.skip(payload as u32);
        Ok(())
    }

    fn read_sof0_segment(&mut self) -> Result<(), DecodeError> {
        if self.frame_info.component_count != 0 {
            return Err(DecodeError::MalformedHeader); // duplicate SOF
        }
        let payload = self.read_segment_size()?;

        let precision = self.source.read_u8()?;
        if precision != 8 {
            return Err(DecodeError::UnsupportedEncoding);
        }
        let height = self.source.read_u16()?;
        let width = self.source.read_u16()?;
        if width == 0 || height == 0 {
            return Err(DecodeError::MalformedHeader);
        }
        let component_count = self.source.read_u8()?;
        if component_count != 1 && component_count != 3 {
            return Err(DecodeError::UnsupportedEncoding);
        }
        if payload != 6 + 3 * component_count as usize {
            return Err(DecodeError::InvalidMarkerSegmentSize);
        }

        for i in 0..component_count as usize {
            let id = self.source.read_u8()?;
            let sampling = self.source.read_u8()?;
            let quant_table = self.source.read_u8()?;
            let (h, v) = (sampling >> 4, sampling & 0x0F);
            if h == 0 || v == 0 || h > MAX_SAMPLING_FACTOR || v > MAX_SAMPLING_FACTOR {
                return Err(DecodeError::UnsupportedEncoding);
            }
            // Chroma planes are decoded at one block per MCU; higher chroma
            // sampling than 1x1 is outside this decoder's profile.
            if i > 0 && (h != 1 || v != 1) {
                return Err(DecodeError::UnsupportedEncoding);
            }
            if quant_table as usize >= MAX_TABLE_COUNT {
                return Err(DecodeError::MalformedHeader);
            }
            self.components[i] = Component {
                id,
                h_samp_factor: h,
                v_samp_factor: v,
                quant_table,
                dc_table: 0,
                ac_table: 0,
            };
        }
        if component_count == 1 {
            // A single-component frame is scanned one block per MCU whatever
            // its declared sampling factors say.
            self.components[0].h_samp_factor = 1;
            self.components[0].v_samp_factor = 1;
        }

        self.frame_info = FrameInfo {
            width,
            height,
            component_count,
        };
        Ok(())
    }

    fn read_dqt_segment(&mut self) -> Result<(), DecodeError> {
        let mut remaining = self.read_segment_size()?;
        while remaining > 0 {
            if remaining < 1 + BLOCK_DIM {
                return Err(DecodeError::InvalidMarkerSegmentSize);
            }
            let pq_tq = self.source.read_u8()?;
            let precision = pq_tq >> 4;
            let table_id = (pq_tq & 0x0F) as usize;
            if precision != 0 {
                return Err(DecodeError::UnsupportedEncoding); // 16-bit tables
            }
            if table_id >= MAX_TABLE_COUNT {
                return Err(DecodeError::MalformedHeader);
            }

            let mut zigzag = [0u8; BLOCK_DIM];
            for entry in zigzag.iter_mut() {
                *entry = self.source.read_u8()?;
            }
            let natural = self.arena.reserve(BLOCK_DIM)?;
            dezigzag_table(&zigzag, natural);
            self.quantization_tables[table_id] = Some(natural);

            remaining -= 1 + BLOCK_DIM;
        }
        Ok(())
    }

    fn read_dht_segment(&mut self) -> Result<(), DecodeError> {
        let mut remaining = self.read_segment_size()?;
        while remaining > 0 {
            if remaining < 17 {
                return Err(DecodeError::InvalidMarkerSegmentSize);
            }
            let tc_th = self.source.read_u8()?;
            let class = tc_th >> 4;
            let table_id = (tc_th & 0x0F) as usize;
            if class > 1 || table_id >= MAX_TABLE_COUNT {
                return Err(DecodeError::MalformedHeader);
            }

            let mut lengths = [0u8; 16];
            let mut total = 0usize;
            for count in lengths.iter_mut() {
                *count = self.source.read_u8()?;
                total += *count as usize;
            }
            if total == 0 || total > 256 || remaining < 17 + total {
                return Err(DecodeError::InvalidMarkerSegmentSize);
            }

            let values = self.arena.reserve(total)?;
            for value in values.iter_mut() {
                *value = self.source.read_u8()?;
            }
            let table = HuffmanTable::from_dht(&lengths, values, self.arena)?;
            if class == 0 {
                self.dc_tables[table_id] = Some(table);
            } else {
                self.ac_tables[table_id] = Some(table);
            }

            remaining -= 17 + total;
        }
        Ok(())
    }

    fn read_dri_segment(&mut self) -> Result<(), DecodeError> {
        if self.read_segment_size()? != 2 {
            return Err(DecodeError::InvalidMarkerSegmentSize);
        }
        self.restart_interval = self.source.read_u16()?;
        Ok(())
    }

    /// Parses the scan header, binds entropy tables to components and
    /// returns the address of the first entropy-coded byte.
    fn read_sos_segment(&mut self) -> Result<u32, DecodeError> {
        let component_count = self.frame_info.component_count;
        if component_count == 0 {
            return Err(DecodeError::MalformedHeader); // SOS before SOF
        }
        let payload = self.read_segment_size()?;

        let scan_components = self.source.read_u8()?;
        // One interleaved scan covering every frame component.
        if scan_components != component_count {
            return Err(DecodeError::UnsupportedEncoding);
        }
        if payload != 4 + 2 * scan_components as usize {
            return Err(DecodeError::InvalidMarkerSegmentSize);
        }

        for _ in 0..scan_components {
            let id = self.source.read_u8()?;
            let tables = self.source.read_u8()?;
            let (dc_table, ac_table) = (tables >> 4, tables & 0x0F);
            if dc_table as usize >= MAX_TABLE_COUNT || ac_table as usize >= MAX_TABLE_COUNT {
                return Err(DecodeError::MalformedHeader);
            }
            let component = self.components[..component_count as usize]
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(DecodeError::MalformedHeader)?;
            component.dc_table = dc_table;
            component.ac_table = ac_table;
        }

        // Spectral selection and successive approximation are fixed in
        // baseline: Ss=0, Se=63, Ah=Al=0.
        let ss = self.source.read_u8()?;
        let se = self.source.read_u8()?;
        let ah_al = self.source.read_u8()?;
        if ss != 0 || se != 63 || ah_al != 0 {
            return Err(DecodeError::UnsupportedEncoding);
        }

        // Every referenced table must exist before the scan starts.
        for component in &self.components[..component_count as usize] {
            if self.quantization_tables[component.quant_table as usize].is_none()
                || self.dc_tables[component.dc_table as usize].is_none()
                || self.ac_tables[component.ac_table as usize].is_none()
            {
                return Err(DecodeError::MalformedHeader);
            }
        }

        Ok(self.source.address())
    }
}
