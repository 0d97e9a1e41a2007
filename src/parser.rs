mod assembler;
mod bit_reader;
mod color_table;
mod decoder;
mod graphic_control;
mod lzw;

pub use assembler::{assemble, select_palette, INVALID_INDEX_COLOR, TRANSPARENT_PIXEL};
pub use color_table::ColorTable;
pub use decoder::{DecodeOptions, Decoder, Header, ImageDescriptor, LoopCount, Version};
pub use graphic_control::{GraphicControl, GraphicControlState};
pub use lzw::{lzw_decode, Decompressed};

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_DESCRIPTOR_LABEL: u8 = 0x2c;
const TRAILER_LABEL: u8 = 0x3b;

/// Top level block kinds, keyed by the introducer byte. Extensions carry
/// their label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Block {
    Image,
    Extension(ExtensionType),
    Trailer,
    Unknown(u8),
}

// Extension labels
const APPLICATION_EXTENSION: u8 = 0xff;
const COMMENT_EXTENSION: u8 = 0xfe;
const GRAPHIC_CONTROL_EXTENSION: u8 = 0xf9;
const PLAIN_TEXT_EXTENSION: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExtensionType {
    Application,
    Comment,
    GraphicControl,
    PlainText,
    Other(u8),
}

impl From<u8> for ExtensionType {
    fn from(value: u8) -> Self {
        use ExtensionType::*;

        match value {
            APPLICATION_EXTENSION => Application,
            COMMENT_EXTENSION => Comment,
            GRAPHIC_CONTROL_EXTENSION => GraphicControl,
            PLAIN_TEXT_EXTENSION => PlainText,
            label => Other(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_extension_labels() {
        assert_eq!(ExtensionType::from(0xf9), ExtensionType::GraphicControl);
        assert_eq!(ExtensionType::from(0xff), ExtensionType::Application);
        assert_eq!(ExtensionType::from(0xfe), ExtensionType::Comment);
        assert_eq!(ExtensionType::from(0x01), ExtensionType::PlainText);
        assert_eq!(ExtensionType::from(0x99), ExtensionType::Other(0x99));
    }
}
