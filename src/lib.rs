//! Decodes GIF87a/GIF89a streams into a list of RGBA8 frames.
//!
//! ```no_run
//! let decoded = gif_frames::decode_file("animation.gif")?;
//! for frame in &decoded.frames {
//!     println!("{}x{} for {}ms", frame.width(), frame.height(), frame.delay_ms());
//! }
//! # Ok::<(), gif_frames::DecodeError>(())
//! ```
//!
//! Decoding is best effort. Broken blocks are skipped and counted in
//! [`Decoded::skipped_blocks`], a truncated stream keeps every frame that could
//! be recovered, and only an invalid header produces an empty result (with the
//! reason in [`Decoded::error`]). Interlaced images are decoded with their rows
//! in stream order.

mod error;
mod frame;
mod parser;

#[cfg(test)]
mod test_support;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub use error::DecodeError;
pub use frame::{Decoded, Frame};
pub use parser::{
    assemble, lzw_decode, select_palette, ColorTable, DecodeOptions, Decoder, Decompressed,
    GraphicControl, GraphicControlState, Header, ImageDescriptor, LoopCount, Version,
    INVALID_INDEX_COLOR, TRANSPARENT_PIXEL,
};

/// Decodes a whole stream with the default options.
pub fn decode<R: Read>(mut reader: R) -> Decoded {
    Decoder::new(&mut reader).decode()
}

pub fn decode_with_options<R: Read>(mut reader: R, options: DecodeOptions) -> Decoded {
    Decoder::with_options(&mut reader, options).decode()
}

/// Opens and decodes a file. Only failing to open the file is an error.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Decoded, DecodeError> {
    decode_file_with_options(path, DecodeOptions::default())
}

pub fn decode_file_with_options<P: AsRef<Path>>(
    path: P,
    options: DecodeOptions,
) -> Result<Decoded, DecodeError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    Ok(Decoder::with_options(&mut reader, options).decode())
}
