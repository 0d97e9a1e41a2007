use super::color_table::ColorTable;

/// Colour written for indices the palette cannot resolve.
pub const INVALID_INDEX_COLOR: [u8; 4] = [255, 0, 255, 255];
pub const TRANSPARENT_PIXEL: [u8; 4] = [0, 0, 0, 0];

/// Local table wins over the global one.
pub fn select_palette<'a>(
    local: Option<&'a ColorTable>,
    global: Option<&'a ColorTable>,
) -> Option<&'a ColorTable> {
    local.or(global)
}

/// Expands palette indices into RGBA8.
pub fn assemble(
    indices: &[u8],
    palette: Option<&ColorTable>,
    transparent_index: Option<u8>,
) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(indices.len() * 4);

    for &index in indices {
        let rgba = if transparent_index == Some(index) {
            TRANSPARENT_PIXEL
        } else {
            match palette.and_then(|palette| palette.get(index)) {
                Some([red, green, blue]) => [red, green, blue, 255],
                None => INVALID_INDEX_COLOR,
            }
        };
        pixels.extend_from_slice(&rgba);
    }

    pixels
}
