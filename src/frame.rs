use crate::error::DecodeError;
use crate::parser::{Header, LoopCount};

/// One decoded image block as RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Box<[u8]>,
    width: u16,
    height: u16,
    left: u16,
    top: u16,
    delay_ms: u32,
}

impl Frame {
    pub(crate) fn new(
        pixels: Vec<u8>,
        width: u16,
        height: u16,
        left: u16,
        top: u16,
        delay_ms: u32,
    ) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            pixels: pixels.into_boxed_slice(),
            width,
            height,
            left,
            top,
            delay_ms,
        }
    }

    /// Row-major RGBA8, `width * height * 4` bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Offset of the frame on the logical screen.
    pub fn left(&self) -> u16 {
        self.left
    }

    pub fn top(&self) -> u16 {
        self.top
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let rgba = &self.pixels[offset..offset + 4];
        Some([rgba[0], rgba[1], rgba[2], rgba[3]])
    }
}

/// Everything one decode call recovered from a stream.
#[derive(Debug, Default)]
pub struct Decoded {
    pub frames: Vec<Frame>,
    /// `None` when the header itself could not be read.
    pub header: Option<Header>,
    pub loop_count: Option<LoopCount>,
    pub comments: Vec<String>,
    /// Blocks that failed to decode and were dropped.
    pub skipped_blocks: usize,
    /// The input ended before the trailer.
    pub truncated: bool,
    /// Set when the header or global color table could not be read (including
    /// input that ends inside them), or on an I/O error other than end of input.
    /// A stream that ends after the header only sets `truncated`.
    pub error: Option<DecodeError>,
}

impl Decoded {
    /// No fatal error, no skipped blocks and the trailer was reached.
    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.skipped_blocks == 0 && !self.truncated
    }
}
