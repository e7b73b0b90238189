//! Minimal RIFF/WAVE header walk used to measure chunk length.
//!
//! Only the `fmt ` and `data` sub-chunks matter here; the sample payload is
//! never read. Duration comes from the size the `data` chunk declares.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::WavError;

const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const WAVE_MAGIC: &[u8; 4] = b"WAVE";
const FMT_ID: &[u8; 4] = b"fmt ";
const DATA_ID: &[u8; 4] = b"data";
const MIN_FMT_LEN: usize = 16;

/// Audio format fields pulled from the `fmt ` chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

/// Opens `path` and returns the clip length in seconds.
pub fn wav_duration_path(path: &Path) -> Result<f64, WavError> {
    let file = File::open(path)?;
    wav_duration(&mut BufReader::new(file))
}

/// Returns the clip length in seconds of the WAV stream behind `reader`.
pub fn wav_duration<R: Read + Seek>(reader: &mut R) -> Result<f64, WavError> {
    let mut header = [0u8; 12];
    reader.read_exact(&mut header)?;

    if &header[0..4] != RIFF_MAGIC || &header[8..12] != WAVE_MAGIC {
        return Err(WavError::Format("not a WAV file".to_string()));
    }

    let mut format = WavFormat::default();
    let data_size: u32;

    loop {
        let mut chunk_header = [0u8; 8];
        reader.read_exact(&mut chunk_header)?;

        let id = &chunk_header[0..4];
        let size = u32::from_le_bytes([
            chunk_header[4],
            chunk_header[5],
            chunk_header[6],
            chunk_header[7],
        ]);

        if id == FMT_ID {
            format = read_fmt_chunk(reader, size)?;
        } else if id == DATA_ID {
            data_size = size;
            break;
        } else {
            // RIFF chunks are word aligned.
            let skip = i64::from(size) + i64::from(size % 2);
            reader.seek(SeekFrom::Current(skip))?;
        }
    }

    if format.sample_rate == 0 || format.channels == 0 || format.bits_per_sample == 0 {
        return Err(WavError::Format(
            "missing audio format information".to_string(),
        ));
    }

    let bytes_per_sample = u32::from(format.bits_per_sample / 8) * u32::from(format.channels);
    if bytes_per_sample == 0 {
        return Err(WavError::Format("invalid bytes per sample".to_string()));
    }

    let duration =
        f64::from(data_size) / f64::from(bytes_per_sample) / f64::from(format.sample_rate);
    if !duration.is_finite() {
        return Err(WavError::Format("invalid duration computed".to_string()));
    }

    Ok(duration)
}

fn read_fmt_chunk<R: Read>(reader: &mut R, size: u32) -> Result<WavFormat, WavError> {
    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(u64::from(size))
        .read_to_end(&mut buf)?;

    if buf.len() < size as usize {
        return Err(WavError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "fmt chunk truncated",
        )));
    }
    if buf.len() < MIN_FMT_LEN {
        return Err(WavError::Format("invalid fmt chunk".to_string()));
    }

    Ok(WavFormat {
        channels: u16::from_le_bytes([buf[2], buf[3]]),
        sample_rate: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        bits_per_sample: u16::from_le_bytes([buf[14], buf[15]]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Builds a header with an optional extra chunk before `fmt `.
    fn wav_bytes(
        channels: u16,
        sample_rate: u32,
        bits: u16,
        data_size: u32,
        extra: Option<(&[u8; 4], &[u8])>,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(b"WAVE");

        if let Some((id, body)) = extra {
            out.extend_from_slice(id);
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(body);
            if body.len() % 2 == 1 {
                out.push(0);
            }
        }

        let block_align = channels * (bits / 8);
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());

        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_size.to_le_bytes());
        out
    }

    #[test]
    fn test_mono_16k_one_second() {
        let bytes = wav_bytes(1, 16_000, 16, 32_000, None);
        let duration = wav_duration(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(duration, 1.0);
    }

    #[test]
    fn test_stereo_44k_duration() {
        // 2 channels * 2 bytes * 44100 Hz * 3 s
        let bytes = wav_bytes(2, 44_100, 16, 529_200, None);
        let duration = wav_duration(&mut Cursor::new(bytes)).unwrap();
        assert!((duration - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_payload_not_required() {
        // data chunk declares 10 s but no sample bytes follow
        let bytes = wav_bytes(1, 16_000, 16, 320_000, None);
        let duration = wav_duration(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(duration, 10.0);
    }

    #[test]
    fn test_skips_unknown_odd_sized_chunk() {
        let bytes = wav_bytes(1, 16_000, 16, 16_000, Some((b"LIST", b"abc")));
        let duration = wav_duration(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(duration, 0.5);
    }

    #[test]
    fn test_missing_riff_magic() {
        let mut bytes = wav_bytes(1, 16_000, 16, 32_000, None);
        bytes[0..4].copy_from_slice(b"RIFX");
        let err = wav_duration(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, WavError::Format(_)));
    }

    #[test]
    fn test_missing_wave_magic() {
        let mut bytes = wav_bytes(1, 16_000, 16, 32_000, None);
        bytes[8..12].copy_from_slice(b"AVI ");
        let err = wav_duration(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, WavError::Format(_)));
    }

    #[test]
    fn test_short_header_is_io_error() {
        let err = wav_duration(&mut Cursor::new(b"RIFF".to_vec())).unwrap_err();
        assert!(matches!(err, WavError::Io(_)));
    }

    #[test]
    fn test_missing_data_chunk_is_io_error() {
        let mut bytes = wav_bytes(1, 16_000, 16, 32_000, None);
        bytes.truncate(bytes.len() - 8);
        let err = wav_duration(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, WavError::Io(_)));
    }

    #[test]
    fn test_short_fmt_chunk() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);

        let err = wav_duration(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, WavError::Format(msg) if msg.contains("fmt")));
    }

    #[test]
    fn test_zero_sample_rate() {
        let bytes = wav_bytes(1, 0, 16, 32_000, None);
        let err = wav_duration(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, WavError::Format(_)));
    }

    #[test]
    fn test_sub_byte_samples_rejected() {
        let bytes = wav_bytes(1, 16_000, 4, 32_000, None);
        let err = wav_duration(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, WavError::Format(msg) if msg.contains("bytes per sample")));
    }

    #[test]
    fn test_data_before_fmt_is_format_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&100u32.to_le_bytes());

        let err = wav_duration(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, WavError::Format(_)));
    }

    #[test]
    fn test_wav_duration_path_nonexistent() {
        let err = wav_duration_path(Path::new("/nonexistent/chunk_000.wav")).unwrap_err();
        assert!(matches!(err, WavError::Io(_)));
    }
}
