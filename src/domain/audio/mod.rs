pub mod chunker;
pub mod format;
pub mod wav;

pub use chunker::chunk_text;
pub use format::SampleFormat;
pub use wav::{encode_wav, merge_wavs, WavError, WavHeader};
