pub mod dump;
pub mod transcript;
pub mod wav;

pub use dump::write_base64_file;
pub use transcript::{read_preview, PREVIEW_LIMIT};
pub use wav::{wav_duration, wav_duration_path, WavFormat};
