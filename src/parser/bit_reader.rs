/// Reads LSB-first variable width codes out of a byte buffer.
///
/// Reads are tolerant: a code that runs off the end of the buffer is completed
/// with zero bits. Only a code that *starts* past the end is refused, which is
/// what lets the LZW loop terminate on a truncated payload.
pub struct BitReader<'a> {
    buf: &'a [u8],
    // index by bit instead of by byte
    position: usize,
    length: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            position: 0,
            length: buf.len() * 8,
        }
    }

    pub fn next(&mut self, count: u32) -> Option<u16> {
        debug_assert!(count <= 16);

        let start_position = self.position;
        if start_position >= self.length {
            return None;
        }
        let end_position = start_position + count as usize;

        // end_position not inclusive, i always forget..
        let mut value: u16 = 0;
        for (out_shift, i) in (start_position..end_position.min(self.length)).enumerate() {
            let byte = self.buf[i / 8];
            let bit = (byte >> (i % 8)) as u16 & 1;
            value |= bit << out_shift;
        }
        self.position = end_position;
        Some(value)
    }

    /// True once a read had to be padded with zero bits.
    pub fn overran(&self) -> bool {
        self.position > self.length
    }
}
