//! Builders for WAV fixtures.

#![allow(dead_code)]

/// Builder for in-memory RIFF/WAVE files. Only the header is realistic; the
/// data chunk is zero-filled.
pub struct WavBuilder {
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    data_bytes: u32,
    extra_chunks: Vec<([u8; 4], Vec<u8>)>,
}

impl WavBuilder {
    /// Mono 16 kHz 16-bit PCM, the transcoder's output format.
    pub fn new() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            bits_per_sample: 16,
            data_bytes: 0,
            extra_chunks: Vec::new(),
        }
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn bits_per_sample(mut self, bits: u16) -> Self {
        self.bits_per_sample = bits;
        self
    }

    /// Sizes the data chunk to hold `seconds` of audio.
    pub fn seconds(mut self, seconds: f64) -> Self {
        let per_second =
            self.sample_rate * u32::from(self.channels) * u32::from(self.bits_per_sample / 8);
        self.data_bytes = (seconds * f64::from(per_second)).round() as u32;
        self
    }

    /// Inserts an unrelated chunk (e.g. `LIST`) between `fmt ` and `data`.
    pub fn extra_chunk(mut self, id: &[u8; 4], body: &[u8]) -> Self {
        self.extra_chunks.push((*id, body.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let block_align = self.channels * (self.bits_per_sample / 8);
        let byte_rate = self.sample_rate * u32::from(block_align);

        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");

        body.extend_from_slice(b"fmt ");
        body.extend_from_slice(&16u32.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&self.channels.to_le_bytes());
        body.extend_from_slice(&self.sample_rate.to_le_bytes());
        body.extend_from_slice(&byte_rate.to_le_bytes());
        body.extend_from_slice(&block_align.to_le_bytes());
        body.extend_from_slice(&self.bits_per_sample.to_le_bytes());

        for (id, chunk) in &self.extra_chunks {
            body.extend_from_slice(id);
            body.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
            body.extend_from_slice(chunk);
            if chunk.len() % 2 == 1 {
                body.push(0);
            }
        }

        body.extend_from_slice(b"data");
        body.extend_from_slice(&self.data_bytes.to_le_bytes());
        body.resize(body.len() + self.data_bytes as usize, 0);

        let mut out = Vec::with_capacity(body.len() + 8);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }
}

impl Default for WavBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Transcoder output for a recording split into segments of the given lengths.
pub fn segments(seconds: &[f64]) -> Vec<Vec<u8>> {
    seconds
        .iter()
        .map(|s| WavBuilder::new().seconds(*s).build())
        .collect()
}

/// Bytes that are not a WAV file at all.
pub fn garbage_segment() -> Vec<u8> {
    b"this is not a riff file".to_vec()
}
