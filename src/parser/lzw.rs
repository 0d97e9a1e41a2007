use log::{debug, trace};

use super::bit_reader::BitReader;
use crate::error::{DecodeError, Result};

pub const MIN_CODE_SIZE: u8 = 2;
pub const MAX_MIN_CODE_SIZE: u8 = 8;
pub const MAX_CODE_WIDTH: u32 = 12;
pub const MAX_ENTRIES: usize = 1 << MAX_CODE_WIDTH;

/// One dictionary entry. Entries are stored as a link to their prefix entry
/// plus the byte appended to it, so the whole table lives in one flat arena
/// indexed by code.
#[derive(Debug, Clone, Copy)]
struct Link {
    prefix: Option<u16>,
    byte: u8,
    first: u8,
    len: u16,
}

impl Link {
    fn root(byte: u8) -> Self {
        Self {
            prefix: None,
            byte,
            first: byte,
            len: 1,
        }
    }
}

#[derive(Debug)]
struct Dictionary {
    links: Vec<Link>,
    // roots + clear + end
    initial_len: usize,
}

impl Dictionary {
    fn new(minimum_code_size: u8) -> Self {
        let roots = 1usize << minimum_code_size;
        let mut links = Vec::with_capacity(MAX_ENTRIES);
        links.extend((0..roots).map(|i| Link::root(i as u8)));
        // placeholders for the clear and end codes, never emitted
        links.push(Link::root(0));
        links.push(Link::root(0));

        Self {
            links,
            initial_len: roots + 2,
        }
    }

    fn reset(&mut self) {
        self.links.truncate(self.initial_len);
    }

    fn len(&self) -> usize {
        self.links.len()
    }

    fn is_full(&self) -> bool {
        self.links.len() >= MAX_ENTRIES
    }

    fn first(&self, code: u16) -> u8 {
        self.links[code as usize].first
    }

    /// Adds `{prefix}+byte`. Returns false once the table holds 4096 entries.
    fn push(&mut self, prefix: u16, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        let parent = self.links[prefix as usize];
        self.links.push(Link {
            prefix: Some(prefix),
            byte,
            first: parent.first,
            len: parent.len + 1,
        });
        true
    }

    /// Appends the byte sequence for `code` to `out`.
    fn write(&self, code: u16, out: &mut Vec<u8>) {
        let link = self.links[code as usize];
        let start = out.len();
        out.resize(start + link.len as usize, 0);

        let mut cursor = Some(code);
        for slot in out[start..].iter_mut().rev() {
            let Some(current) = cursor else { break };
            let link = self.links[current as usize];
            *slot = link.byte;
            cursor = link.prefix;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// All mutable state for decoding one image block's LZW stream.
#[derive(Debug)]
struct LzwDecoder {
    dictionary: Dictionary,
    minimum_code_size: u8,
    clear_code: u16,
    end_code: u16,
    code_width: u32,
    previous: Option<u16>,
}

impl LzwDecoder {
    fn new(minimum_code_size: u8) -> Self {
        let clear_code = 1u16 << minimum_code_size;
        Self {
            dictionary: Dictionary::new(minimum_code_size),
            minimum_code_size,
            clear_code,
            end_code: clear_code + 1,
            code_width: u32::from(minimum_code_size) + 1,
            previous: None,
        }
    }

    fn reset(&mut self) {
        self.dictionary.reset();
        self.code_width = u32::from(self.minimum_code_size) + 1;
        self.previous = None;
    }

    fn append(&mut self, prefix: u16, byte: u8) -> bool {
        if !self.dictionary.push(prefix, byte) {
            return false;
        }
        if self.dictionary.len() == 1 << self.code_width && self.code_width < MAX_CODE_WIDTH {
            self.code_width += 1;
        }
        true
    }

    fn handle(&mut self, code: u16, out: &mut Vec<u8>) -> Flow {
        if code == self.end_code {
            return Flow::Stop;
        }

        if code == self.clear_code {
            trace!("clear code, resetting dictionary of {} entries", self.dictionary.len());
            self.reset();
            return Flow::Continue;
        }

        let next_code = self.dictionary.len();
        match self.previous {
            _ if (code as usize) < next_code => {
                self.dictionary.write(code, out);
                if let Some(previous) = self.previous {
                    // {CODE-1}+K where K is the first index of {CODE}
                    let k = self.dictionary.first(code);
                    self.append(previous, k);
                }
            }
            Some(previous) if code as usize == next_code => {
                // {CODE-1}+K where K is the first index of {CODE-1}
                let k = self.dictionary.first(previous);
                if !self.append(previous, k) {
                    return Flow::Stop;
                }
                self.dictionary.write(code, out);
            }
            Some(_) => {
                debug!("code {code} is past the next free code {next_code}, stopping");
                return Flow::Stop;
            }
            None => {
                debug!("code {code} is not in the dictionary and has no previous code, stopping");
                return Flow::Stop;
            }
        }

        self.previous = Some(code);
        Flow::Continue
    }
}

/// Decompressed index stream of one image, always exactly `width * height` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decompressed {
    pub indices: Vec<u8>,
    /// How many leading indices came out of the code stream; the rest is zero padding.
    pub decoded: usize,
}

impl Decompressed {
    pub fn is_complete(&self) -> bool {
        self.decoded == self.indices.len()
    }
}

/// Decodes a de-framed GIF LZW payload into `pixel_count` palette indices.
///
/// Malformed or truncated code streams never fail: decoding stops at the
/// first code that cannot be interpreted and the remainder is zero padded.
/// Output past `pixel_count` is discarded. The only error is a minimum code
/// size outside of `2..=8`.
pub fn lzw_decode(buf: &[u8], minimum_code_size: u8, pixel_count: usize) -> Result<Decompressed> {
    if !(MIN_CODE_SIZE..=MAX_MIN_CODE_SIZE).contains(&minimum_code_size) {
        return Err(DecodeError::InvalidMinCodeSize(minimum_code_size));
    }

    let mut decoder = LzwDecoder::new(minimum_code_size);
    let mut reader = BitReader::new(buf);
    let mut indices = Vec::with_capacity(pixel_count);

    while indices.len() < pixel_count {
        let Some(code) = reader.next(decoder.code_width) else {
            break;
        };
        if decoder.handle(code, &mut indices) == Flow::Stop {
            break;
        }
    }

    let decoded = indices.len().min(pixel_count);
    if decoded < pixel_count {
        debug!(
            "lzw stream produced {decoded} of {pixel_count} indices (overran: {}), zero padding",
            reader.overran()
        );
    }
    indices.resize(pixel_count, 0);

    Ok(Decompressed { indices, decoded })
}
