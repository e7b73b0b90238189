use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderWriter;

/// Streams `src` into a base64 text file at `dst` without buffering the whole
/// input in memory.
pub fn write_base64_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    let mut input = BufReader::new(File::open(src)?);
    let output = BufWriter::new(File::create(dst)?);

    let mut encoder = EncoderWriter::new(output, &STANDARD);
    std::io::copy(&mut input, &mut encoder)?;

    let mut output = encoder.finish()?;
    output.flush()?;
    output
        .into_inner()
        .map_err(|e| e.into_error())?
        .sync_all()
}
