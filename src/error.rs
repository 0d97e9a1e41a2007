use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("signature is invalid")]
    InvalidSignature,

    #[error("version {0} in the header is unsupported")]
    UnsupportedVersion(String),

    #[error("encountered unexpected label, this label is not supported: 0x{0:02x}")]
    UnexpectedLabel(u8),

    #[error("lzw minimum code size {0} is outside of 2..=8")]
    InvalidMinCodeSize(u8),

    #[error("graphic control extension has block size {0}, expected 4")]
    InvalidGraphicControlSize(u8),

    #[error("image of {width}x{height} pixels is too large to decode")]
    ImageTooLarge { width: u16, height: u16 },

    #[error("image data ended before every pixel was decoded")]
    TruncatedImageData,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// Errors in the header abort the whole decode, everything else only costs
    /// the block it occurred in.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecodeError::InvalidSignature | DecodeError::UnsupportedVersion(_))
    }

    /// The input ran out while a block was being read.
    pub fn is_truncation(&self) -> bool {
        match self {
            DecodeError::Io(err) => err.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_errors_are_fatal() {
        assert!(DecodeError::InvalidSignature.is_fatal());
        assert!(DecodeError::UnsupportedVersion("90a".into()).is_fatal());
        assert!(!DecodeError::UnexpectedLabel(0x42).is_fatal());
        assert!(!DecodeError::InvalidMinCodeSize(12).is_fatal());
    }

    #[test]
    fn eof_is_truncation() {
        let eof = DecodeError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(eof.is_truncation());
        let other = DecodeError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!other.is_truncation());
        assert!(!DecodeError::TruncatedImageData.is_truncation());
    }
}
