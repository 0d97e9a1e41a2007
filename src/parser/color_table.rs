/// A global or local palette of RGB triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    entries: Box<[[u8; 3]]>,
}

impl ColorTable {
    /// Number of entries described by the low three bits of a packed field.
    pub fn size_from_flags(packed_fields: u8) -> usize {
        2 << (packed_fields & 0b00000111)
    }

    /// Builds a table from raw `r, g, b` bytes. A trailing partial triple is ignored.
    pub fn from_rgb(bytes: &[u8]) -> Self {
        let entries = bytes
            .chunks_exact(3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.entries.get(index as usize).copied()
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }
}
