//! Fixture builders for the unit tests: a small LZW encoder and a byte level
//! GIF writer. Neither is meant to produce optimal output.

use std::collections::HashMap;

const MAX_ENTRIES: u16 = 4096;

#[derive(Debug, Clone, Copy)]
pub(crate) struct EncodeOptions {
    /// Emit a clear code before the first data code.
    pub leading_clear: bool,
    /// Emit a clear code once the table is full instead of carrying on at 12 bits.
    pub clear_when_full: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            leading_clear: true,
            clear_when_full: true,
        }
    }
}

pub(crate) fn lzw_encode(data: &[u8], min_code_size: u8) -> Vec<u8> {
    lzw_encode_with(data, min_code_size, EncodeOptions::default())
}

pub(crate) fn lzw_encode_with(data: &[u8], min_code_size: u8, options: EncodeOptions) -> Vec<u8> {
    lzw_codes(data, min_code_size, options)
        .into_iter()
        .fold(BitWriter::new(), |mut writer, (code, width)| {
            writer.write_bits(code, width);
            writer
        })
        .finish()
}

/// The code sequence the encoder emits, each paired with the width it is written at.
pub(crate) fn lzw_codes(data: &[u8], min_code_size: u8, options: EncodeOptions) -> Vec<(u16, u32)> {
    let clear_code = 1u16 << min_code_size;
    let end_code = clear_code + 1;

    let mut codes = Vec::new();
    let mut code_size = u32::from(min_code_size) + 1;
    let mut next_code = end_code + 1;
    let mut table: HashMap<(u16, u8), u16> = HashMap::new();

    if options.leading_clear {
        codes.push((clear_code, code_size));
    }

    let Some((&first, rest)) = data.split_first() else {
        codes.push((end_code, code_size));
        return codes;
    };

    let mut prefix = u16::from(first);
    for &byte in rest {
        if let Some(&code) = table.get(&(prefix, byte)) {
            prefix = code;
            continue;
        }

        codes.push((prefix, code_size));
        if next_code < MAX_ENTRIES {
            table.insert((prefix, byte), next_code);
            next_code += 1;
            if u32::from(next_code) > (1 << code_size) && code_size < 12 {
                code_size += 1;
            }
        } else if options.clear_when_full {
            codes.push((clear_code, code_size));
            table.clear();
            code_size = u32::from(min_code_size) + 1;
            next_code = end_code + 1;
        }
        prefix = u16::from(byte);
    }

    codes.push((prefix, code_size));
    codes.push((end_code, code_size));
    codes
}

pub(crate) struct BitWriter {
    data: Vec<u8>,
    current: u32,
    bits: u32,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self { data: Vec::new(), current: 0, bits: 0 }
    }

    pub(crate) fn write_bits(&mut self, value: u16, num_bits: u32) {
        self.current |= u32::from(value) << self.bits;
        self.bits += num_bits;
        while self.bits >= 8 {
            self.data.push(self.current as u8);
            self.current >>= 8;
            self.bits -= 8;
        }
    }

    pub(crate) fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.data.push(self.current as u8);
        }
        self.data
    }
}

/// Deterministic noise so large fixtures actually grow the dictionary.
pub(crate) fn noise(len: usize, modulus: u8, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            ((state >> 16) % u32::from(modulus)) as u8
        })
        .collect()
}

fn table_bits(len: usize) -> u8 {
    let mut bits = 0;
    while (2usize << bits) < len {
        bits += 1;
    }
    bits
}

fn push_table(data: &mut Vec<u8>, colors: &[[u8; 3]]) {
    let size = 2usize << table_bits(colors.len());
    for i in 0..size {
        data.extend_from_slice(&colors.get(i).copied().unwrap_or([0, 0, 0]));
    }
}

fn push_sub_blocks(data: &mut Vec<u8>, payload: &[u8]) {
    for chunk in payload.chunks(255) {
        data.push(chunk.len() as u8);
        data.extend_from_slice(chunk);
    }
    data.push(0);
}

pub(crate) struct GifBuilder {
    data: Vec<u8>,
}

impl GifBuilder {
    pub(crate) fn new(width: u16, height: u16, global: Option<&[[u8; 3]]>) -> Self {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        match global {
            Some(colors) => {
                data.push(0b1000_0000 | 0b0111_0000 | table_bits(colors.len()));
                data.extend_from_slice(&[0, 0]);
                push_table(&mut data, colors);
            }
            None => data.extend_from_slice(&[0, 0, 0]),
        }
        Self { data }
    }

    pub(crate) fn graphic_control(mut self, delay_cs: u16, transparent: Option<u8>) -> Self {
        self.data.extend_from_slice(&[0x21, 0xf9, 0x04]);
        self.data.push(if transparent.is_some() { 0b0000_0001 } else { 0 });
        self.data.extend_from_slice(&delay_cs.to_le_bytes());
        self.data.push(transparent.unwrap_or(0));
        self.data.push(0);
        self
    }

    pub(crate) fn image(
        self,
        width: u16,
        height: u16,
        local: Option<&[[u8; 3]]>,
        min_code_size: u8,
        indices: &[u8],
    ) -> Self {
        let payload = lzw_encode(indices, min_code_size);
        self.raw_image(width, height, local, min_code_size, &payload)
    }

    pub(crate) fn raw_image(
        mut self,
        width: u16,
        height: u16,
        local: Option<&[[u8; 3]]>,
        min_code_size: u8,
        payload: &[u8],
    ) -> Self {
        self.data.push(0x2c);
        for field in [0u16, 0, width, height] {
            self.data.extend_from_slice(&field.to_le_bytes());
        }
        match local {
            Some(colors) => {
                self.data.push(0b1000_0000 | table_bits(colors.len()));
                push_table(&mut self.data, colors);
            }
            None => self.data.push(0),
        }
        self.data.push(min_code_size);
        push_sub_blocks(&mut self.data, payload);
        self
    }

    pub(crate) fn extension(mut self, label: u8, payload: &[u8]) -> Self {
        self.data.extend_from_slice(&[0x21, label]);
        push_sub_blocks(&mut self.data, payload);
        self
    }

    pub(crate) fn bytes(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub(crate) fn trailer(mut self) -> Self {
        self.data.push(0x3b);
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.data
    }
}
