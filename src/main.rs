use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};

mod ppm_writer;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(input) = args.next() else {
        bail!("usage: gif-frames <input.gif> [output-dir]");
    };
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;

    let decoded = gif_frames::decode_file(&input)
        .with_context(|| format!("failed to open {input}"))?;
    if let Some(err) = decoded.error {
        bail!("failed to decode {input}: {err}");
    }
    if decoded.skipped_blocks > 0 || decoded.truncated {
        warn!(
            "{input} is damaged: {} blocks skipped, truncated: {}",
            decoded.skipped_blocks, decoded.truncated
        );
    }

    for (i, frame) in decoded.frames.iter().enumerate() {
        let path = output_dir.join(format!("frame_{}.ppm", i));
        ppm_writer::write_ppm(&path, frame)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {} ({}ms)", path.display(), frame.delay_ms());
    }
    Ok(())
}
