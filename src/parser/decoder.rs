use super::assembler::{assemble, select_palette};
use super::color_table::ColorTable;
use super::graphic_control::{GraphicControl, GraphicControlState};
use super::lzw;
use super::{Block, ExtensionType, EXTENSION_INTRODUCER, IMAGE_DESCRIPTOR_LABEL, TRAILER_LABEL};
use crate::error::{DecodeError, Result};
use crate::frame::{Decoded, Frame};

use log::{debug, error, warn};

use std::io::{self, prelude::*};

const SIGNATURE: &[u8] = b"GIF";
const LOOPING_APPLICATIONS: [&[u8]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V87a,
    V89a,
}

impl TryFrom<&[u8]> for Version {
    type Error = DecodeError;

    fn try_from(value: &[u8]) -> std::result::Result<Self, Self::Error> {
        match value {
            b"87a" => Ok(Version::V87a),
            b"89a" => Ok(Version::V89a),
            version => Err(DecodeError::UnsupportedVersion(
                String::from_utf8_lossy(version).into_owned(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Number(u16),
}

/// Signature, version and logical screen descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: Version,
    pub screen_width: u16,
    pub screen_height: u16,
    pub packed_fields: u8,
    pub global_color_table_flag: bool,
    pub color_resolution: u8,
    pub sort_flag: bool,
    /// Entry count of the global color table, if there is one.
    pub global_color_table_size: Option<usize>,
    pub background_color_index: u8,
    pub pixel_aspect_ratio: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub left_position: u16,
    pub top_position: u16,
    pub width: u16,
    pub height: u16,
    pub packed_fields: u8,
    pub local_color_table_flag: bool,
    // parsed but not honoured, rows are kept in stream order
    pub interlace_flag: bool,
    pub sort_flag: bool,
    pub local_color_table_size: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Reject image blocks whose LZW stream does not cover every pixel
    /// instead of zero padding them.
    pub strict: bool,
    /// Stop after this many frames.
    pub max_frames: Option<usize>,
    /// Image blocks with more pixels than this are skipped.
    pub max_pixels: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_frames: None,
            max_pixels: 64 * 1024 * 1024,
        }
    }
}

#[derive(Debug)]
struct ImageBlock {
    descriptor: ImageDescriptor,
    control: GraphicControl,
    local_color_table: Option<ColorTable>,
}

#[derive(Debug)]
enum ParserState {
    ProcessHeader,
    ProcessGlobalColorTable(u8),
    ProcessTrailer,

    DetermineNextBlock,
    ProcessExtension(ExtensionType),
    ProcessImageDescriptor,
    ProcessLocalColorTable(ImageBlock),
    ProcessImageData(ImageBlock),

    Done,
}

impl ParserState {
    fn is_header(&self) -> bool {
        matches!(self, ParserState::ProcessHeader | ParserState::ProcessGlobalColorTable(_))
    }
}

/// Decodes one GIF stream front to back.
///
/// The decoder never fails as a whole: a broken header yields an empty
/// [`Decoded`] carrying the error, a broken block is dropped and counted, and
/// a stream that ends early returns what was decoded up to that point.
#[derive(Debug)]
pub struct Decoder<'a, T: Read> {
    inner: &'a mut T,
    options: DecodeOptions,
    global_color_table: Option<ColorTable>,
    graphic_control: GraphicControlState,
    decoded: Decoded,
}

impl<'a, T: Read> Decoder<'a, T> {
    pub fn new(inner: &'a mut T) -> Self {
        Self::with_options(inner, DecodeOptions::default())
    }

    pub fn with_options(inner: &'a mut T, options: DecodeOptions) -> Self {
        Self {
            inner,
            options,
            global_color_table: None,
            graphic_control: GraphicControlState::default(),
            decoded: Decoded::default(),
        }
    }

    pub fn decode(mut self) -> Decoded {
        let mut state = ParserState::ProcessHeader;

        loop {
            debug!("begin parsing state {:?}", state);

            let in_header = state.is_header();
            state = match self.process_next_state(state) {
                Ok(ParserState::Done) => break,
                Ok(next_state) => next_state,
                Err(err) if in_header => {
                    error!("unable to decode gif header: {err}");
                    self.decoded.error = Some(err);
                    break;
                }
                Err(err @ DecodeError::Io(_)) => {
                    if err.is_truncation() {
                        warn!("stream ended before the trailer");
                        self.decoded.truncated = true;
                    } else {
                        error!("unable to read stream: {err}");
                        self.decoded.error = Some(err);
                    }
                    break;
                }
                Err(err) => {
                    warn!("skipping block: {err}");
                    self.decoded.skipped_blocks += 1;
                    ParserState::DetermineNextBlock
                }
            };
        }

        debug!(
            "decoded {} frames, skipped {} blocks",
            self.decoded.frames.len(),
            self.decoded.skipped_blocks
        );
        self.decoded
    }

    fn process_next_state(&mut self, next_state: ParserState) -> Result<ParserState> {
        use ParserState::*;

        match next_state {
            ProcessHeader => {
                let header = self.parse_header()?;
                debug!("processed header, got: {:#?}", header);

                let next_state = if header.global_color_table_flag {
                    ProcessGlobalColorTable(header.packed_fields)
                } else {
                    DetermineNextBlock
                };
                self.decoded.header = Some(header);

                Ok(next_state)
            },
            ProcessGlobalColorTable(packed_fields) => {
                self.global_color_table = self.read_color_table(packed_fields)?;
                debug!(
                    "processed global color table with {} entries",
                    self.global_color_table.as_ref().map_or(0, ColorTable::len)
                );

                Ok(DetermineNextBlock)
            },
            ProcessTrailer => {
                Ok(Done)
            },
            DetermineNextBlock if self.reached_frame_limit() => {
                debug!("reached frame limit of {:?}", self.options.max_frames);
                Ok(Done)
            },
            DetermineNextBlock => match self.read_block()? {
                Block::Image => Ok(ProcessImageDescriptor),
                Block::Extension(label) => Ok(ProcessExtension(label)),
                Block::Trailer => Ok(ProcessTrailer),
                Block::Unknown(label) => Err(DecodeError::UnexpectedLabel(label)),
            },
            ProcessExtension(label) => self.process_extension(label),
            ProcessImageDescriptor => {
                // the pending control block is spent on this image even if it fails to decode
                let control = self.graphic_control.take();
                let descriptor = self.parse_image_descriptor()?;

                let image_block = ImageBlock {
                    descriptor,
                    control,
                    local_color_table: None,
                };

                let next_state = if descriptor.local_color_table_flag {
                    ProcessLocalColorTable(image_block)
                } else {
                    ProcessImageData(image_block)
                };

                Ok(next_state)
            },
            ProcessLocalColorTable(mut image_block) => {
                let packed_fields = image_block.descriptor.packed_fields;
                image_block.local_color_table = self.read_color_table(packed_fields)?;

                Ok(ProcessImageData(image_block))
            },
            ProcessImageData(image_block) => {
                let frame = self.process_image_data(image_block)?;
                self.decoded.frames.push(frame);

                Ok(DetermineNextBlock)
            },
            Done => Ok(Done),
        }
    }

    fn reached_frame_limit(&self) -> bool {
        self.options
            .max_frames
            .is_some_and(|max_frames| self.decoded.frames.len() >= max_frames)
    }

    fn parse_header(&mut self) -> Result<Header> {
        let mut magic = Vec::with_capacity(6);
        self.inner.by_ref().take(6).read_to_end(&mut magic)?;
        if magic.len() < 6 || &magic[..3] != SIGNATURE {
            return Err(DecodeError::InvalidSignature);
        }
        let version = Version::try_from(&magic[3..])?;
        debug!("processed signature, got {:?}", version);

        let screen_width = self.read_u16()?;
        let screen_height = self.read_u16()?;

        let packed_fields = self.read_byte()?;

        // packed field start
        let global_color_table_flag = packed_fields & 0b10000000 != 0;
        let color_resolution = (packed_fields >> 4) & 0b00000111;
        let sort_flag = packed_fields & 0b00001000 != 0;
        let global_color_table_size =
            global_color_table_flag.then(|| ColorTable::size_from_flags(packed_fields));
        // packed field end

        let background_color_index = self.read_byte()?;
        let pixel_aspect_ratio = self.read_byte()?;

        Ok(Header {
            version,
            screen_width,
            screen_height,
            packed_fields,
            global_color_table_flag,
            color_resolution,
            sort_flag,
            global_color_table_size,
            background_color_index,
            pixel_aspect_ratio,
        })
    }

    fn parse_image_descriptor(&mut self) -> Result<ImageDescriptor> {
        let left_position = self.read_u16()?;
        let top_position = self.read_u16()?;

        let width = self.read_u16()?;
        let height = self.read_u16()?;

        let packed_fields = self.read_byte()?;

        let local_color_table_flag = packed_fields & 0b10000000 != 0;
        let interlace_flag = packed_fields & 0b01000000 != 0;
        let sort_flag = packed_fields & 0b00100000 != 0;
        let local_color_table_size =
            local_color_table_flag.then(|| ColorTable::size_from_flags(packed_fields));

        let descriptor = ImageDescriptor {
            left_position,
            top_position,
            width,
            height,
            packed_fields,
            local_color_table_flag,
            interlace_flag,
            sort_flag,
            local_color_table_size,
        };
        debug!("processed image descriptor, got: {:?}", descriptor);

        Ok(descriptor)
    }

    /// Reads the table announced by bit 7 of `packed_fields`, if any.
    fn read_color_table(&mut self, packed_fields: u8) -> Result<Option<ColorTable>> {
        if packed_fields & 0b10000000 == 0 {
            return Ok(None);
        }

        let size = ColorTable::size_from_flags(packed_fields);
        let bytes = self.read_bytes(size * 3)?;
        Ok(Some(ColorTable::from_rgb(&bytes)))
    }

    fn read_block(&mut self) -> Result<Block> {
        let introducer_or_label = self.read_byte()?;

        let block = match introducer_or_label {
            // extension introducer means that a label follows determining what exact type
            // of extension it is.
            EXTENSION_INTRODUCER => Block::Extension(ExtensionType::from(self.read_byte()?)),
            IMAGE_DESCRIPTOR_LABEL => Block::Image,
            TRAILER_LABEL => Block::Trailer,
            label => Block::Unknown(label),
        };
        Ok(block)
    }

    fn process_image_data(&mut self, image_block: ImageBlock) -> Result<Frame> {
        let ImageBlock {
            descriptor,
            control,
            local_color_table,
        } = image_block;

        let lzw_code_size = self.read_byte()?;
        let data_stream = self.read_image_sub_blocks()?;

        let pixel_count = descriptor.width as usize * descriptor.height as usize;
        if pixel_count > self.options.max_pixels {
            return Err(DecodeError::ImageTooLarge {
                width: descriptor.width,
                height: descriptor.height,
            });
        }

        let decompressed = lzw::lzw_decode(&data_stream, lzw_code_size, pixel_count)?;
        if !decompressed.is_complete() {
            if self.options.strict {
                return Err(DecodeError::TruncatedImageData);
            }
            warn!(
                "image data covered {} of {} pixels, padding with index 0",
                decompressed.decoded, pixel_count
            );
        }

        let palette = select_palette(local_color_table.as_ref(), self.global_color_table.as_ref());
        if palette.is_none() {
            warn!("image has no local or global color table");
        }

        let pixels = assemble(&decompressed.indices, palette, control.transparent_index);
        Ok(Frame::new(
            pixels,
            descriptor.width,
            descriptor.height,
            descriptor.left_position,
            descriptor.top_position,
            control.delay_ms,
        ))
    }

    fn process_extension(&mut self, label: ExtensionType) -> Result<ParserState> {
        debug!("processing extension type: {:?}", label);

        match label {
            ExtensionType::GraphicControl => {
                let block = self.read_sub_block()?;
                // an empty first sub-block was already the terminator
                if !block.is_empty() {
                    let trailing = self.skip_sub_blocks()?;
                    if trailing > 0 {
                        warn!(
                            "graphic control extension carries {trailing} unexpected trailing bytes"
                        );
                    }
                }

                match GraphicControl::parse(&block) {
                    Ok(control) => self.graphic_control.set(control),
                    Err(err) => {
                        // a broken control block also voids one that is still pending
                        self.graphic_control.clear();
                        return Err(err);
                    }
                }
            },
            ExtensionType::Application => {
                let application_identifier = self.read_sub_block()?;
                if application_identifier.is_empty() {
                    return Ok(ParserState::DetermineNextBlock);
                }

                if !LOOPING_APPLICATIONS.contains(&&*application_identifier) {
                    self.skip_sub_blocks()?;
                    debug!(
                        "skipped application extension {}",
                        String::from_utf8_lossy(&application_identifier)
                    );
                    return Ok(ParserState::DetermineNextBlock);
                }

                let application_data = self.read_data_sub_blocks()?;
                match *application_data {
                    [1, lo, hi, ..] => {
                        let loop_count = match u16::from_le_bytes([lo, hi]) {
                            0 => LoopCount::Infinite,
                            number => LoopCount::Number(number),
                        };
                        debug!("processed looping extension, got: {:?}", loop_count);
                        self.decoded.loop_count = Some(loop_count);
                    }
                    _ => debug!("looping extension without a loop count sub-block"),
                }
            },
            ExtensionType::Comment => {
                // sequence of data sub-blocks
                let data = self.read_data_sub_blocks()?;
                let comment = String::from_utf8_lossy(&data).into_owned();
                debug!("processed comment block, got: {}", comment);
                self.decoded.comments.push(comment);
            },
            ExtensionType::PlainText | ExtensionType::Other(_) => {
                let skipped = self.skip_sub_blocks()?;
                debug!("skipped {skipped} bytes of {:?} extension", label);
            },
        }

        Ok(ParserState::DetermineNextBlock)
    }

    fn read_bytes(&mut self, count: usize) -> Result<Box<[u8]>> {
        let mut buffer = vec![0; count];
        self.inner.read_exact(&mut buffer)?;
        Ok(buffer.into_boxed_slice())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut buffer: [u8; 1] = [0; 1];
        self.inner.read_exact(&mut buffer)?;
        Ok(buffer[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        // GIF89a: Unless otherwise stated, multi-byte numeric fields are ordered with the Least
        // Significant Byte first.

        let mut buffer: [u8; 2] = [0; 2];
        self.inner.read_exact(&mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }

    /// One length-prefixed sub-block. Empty when the length byte is the terminator.
    fn read_sub_block(&mut self) -> Result<Box<[u8]>> {
        let block_size = self.read_byte()?;
        self.read_bytes(block_size.into())
    }

    fn read_data_sub_blocks(&mut self) -> Result<Box<[u8]>> {
        let mut result = Vec::new();

        loop {
            let block_size = self.read_byte()?;
            if block_size == 0 {
                break;
            }
            result.extend_from_slice(&self.read_bytes(block_size.into())?);
        }

        Ok(result.into_boxed_slice())
    }

    /// Image data is read tolerantly: if the stream ends inside the sub-blocks
    /// the bytes read so far are returned and the next read reports the end.
    fn read_image_sub_blocks(&mut self) -> Result<Vec<u8>> {
        let mut result = Vec::new();

        loop {
            let block_size = match self.read_byte() {
                Ok(0) => break,
                Ok(block_size) => block_size,
                Err(err) if err.is_truncation() => {
                    warn!("image data ended without a block terminator");
                    break;
                }
                Err(err) => return Err(err),
            };

            let read = self.inner.by_ref().take(block_size.into()).read_to_end(&mut result)?;
            if read < block_size as usize {
                warn!("image data sub-block cut short, got {read} of {block_size} bytes");
                break;
            }
        }

        Ok(result)
    }

    /// Skips sub-blocks up to and including the terminator, returns the data bytes skipped.
    fn skip_sub_blocks(&mut self) -> Result<u64> {
        let mut skipped = 0;

        loop {
            let block_size = self.read_byte()?;
            if block_size == 0 {
                return Ok(skipped);
            }

            let mut block = self.inner.by_ref().take(block_size.into());
            let copied = io::copy(&mut block, &mut io::sink())?;
            if copied < u64::from(block_size) {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            skipped += copied;
        }
    }
}
