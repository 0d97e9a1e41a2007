use std::io::{prelude::*, BufWriter};
use std::fs::File;
use std::path::Path;

use anyhow::Result;
use gif_frames::Frame;

const MAGIC_NUMBER: &[u8] = b"P3";

pub fn write_ppm(filename: &Path, frame: &Frame) -> Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);
    write_frame(&mut writer, frame)?;
    writer.flush()?;
    Ok(())
}

/// Plain PPM has no alpha channel, pixels are composited onto black.
fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    let width = frame.width() as usize;

    writer.write_all(MAGIC_NUMBER)?;
    writer.write_all(b"\n")?;
    writer.write_all(format!("{} {}", frame.width(), frame.height()).as_bytes())?;
    writer.write_all(b" 255")?;
    writer.write_all(b"\n")?;

    if width == 0 {
        return Ok(());
    }

    for pixel_row in frame.pixels().chunks(width * 4) {
        pixel_row.chunks_exact(4).enumerate().try_for_each(|(i, rgba)| -> Result<()> {
            let alpha = u16::from(rgba[3]);
            let [red, green, blue] =
                [rgba[0], rgba[1], rgba[2]].map(|c| (u16::from(c) * alpha / 255) as u8);

            writer.write_all(format!("{: >3} {: >3} {: >3}", red, green, blue).as_bytes())?;
            if i != width - 1 {
                writer.write_all(b" ")?;
            }
            Ok(())
        })?;
        writer.write_all(b"\n")?;
    }

    Ok(())
}
