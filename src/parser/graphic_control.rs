use log::debug;

use crate::error::{DecodeError, Result};

/// Delay and transparency taken from a graphic control extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphicControl {
    pub delay_ms: u32,
    pub transparent_index: Option<u8>,
}

impl GraphicControl {
    /// Parses the 4 byte body of the extension's first sub-block.
    pub fn parse(block: &[u8]) -> Result<Self> {
        let &[packed_fields, delay_lo, delay_hi, transparent_color_index] = block else {
            return Err(DecodeError::InvalidGraphicControlSize(block.len().min(255) as u8));
        };

        // packed fields definition
        // XXXYYYZW
        // XXX = reserved, not needed
        // YYY = disposal method, not handled here
        // Z = user input flag
        // W = transparent color flag
        let transparent_color_flag = packed_fields & 0b00000001 != 0;
        let delay_time = u16::from_le_bytes([delay_lo, delay_hi]);

        let control = Self {
            delay_ms: u32::from(delay_time) * 10,
            transparent_index: transparent_color_flag.then_some(transparent_color_index),
        };
        debug!("processed graphic control extension: {:?}", control);
        Ok(control)
    }
}

/// Holds a parsed control block until the next image block claims it.
#[derive(Debug, Default)]
pub struct GraphicControlState {
    pending: Option<GraphicControl>,
}

impl GraphicControlState {
    pub fn set(&mut self, control: GraphicControl) {
        self.pending = Some(control);
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Returns the pending values, or the defaults, and reverts to the defaults.
    pub fn take(&mut self) -> GraphicControl {
        self.pending.take().unwrap_or_default()
    }
}
