//! Minimal RIFF/WAVE container support: encoding raw PCM into a playable
//! file, parsing the fixed 44-byte header back, and merging artifacts that
//! share a format.

pub const WAV_HEADER_LEN: usize = 44;

#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("buffer too short for a wav header ({0} bytes)")]
    TooShort(usize),

    #[error("missing '{0}' marker")]
    BadMarker(&'static str),

    #[error("no input artifacts to merge")]
    NothingToMerge,

    #[error("mismatched formats: {0}")]
    FormatMismatch(String),

    #[error("unsupported wav format: {0}")]
    Unsupported(String),
}

/// The format fields of a parsed WAVE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub data_len: u32,
}

impl WavHeader {
    /// Parse the fixed 44-byte header produced by [`encode_wav`].
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(WavError::TooShort(bytes.len()));
        }
        if &bytes[0..4] != b"RIFF" {
            return Err(WavError::BadMarker("RIFF"));
        }
        if &bytes[8..12] != b"WAVE" {
            return Err(WavError::BadMarker("WAVE"));
        }
        if &bytes[12..16] != b"fmt " {
            return Err(WavError::BadMarker("fmt "));
        }
        if &bytes[36..40] != b"data" {
            return Err(WavError::BadMarker("data"));
        }

        let header = WavHeader {
            channels: u16::from_le_bytes([bytes[22], bytes[23]]),
            sample_rate: u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            bits_per_sample: u16::from_le_bytes([bytes[34], bytes[35]]),
            data_len: u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]),
        };

        // Bound the format fields so downstream byte-rate and block-align
        // arithmetic cannot overflow on a crafted header.
        if header.channels == 0 || header.channels > 16 {
            return Err(WavError::Unsupported(format!(
                "{} channels",
                header.channels
            )));
        }
        if header.sample_rate == 0 || header.sample_rate > 384_000 {
            return Err(WavError::Unsupported(format!(
                "{}Hz sample rate",
                header.sample_rate
            )));
        }
        if !matches!(header.bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(WavError::Unsupported(format!(
                "{} bits per sample",
                header.bits_per_sample
            )));
        }

        Ok(header)
    }
}

/// Wrap raw linear-PCM samples in a playable WAVE container.
///
/// The output is exactly 44 bytes of header followed by `pcm` verbatim.
pub fn encode_wav(pcm: &[u8], sample_rate: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let byte_rate = (u64::from(sample_rate) * u64::from(channels) * u64::from(bits_per_sample) / 8)
        as u32;
    let block_align = (u32::from(channels) * u32::from(bits_per_sample) / 8) as u16;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM format tag
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Merge WAVE artifacts into a single file by concatenating their payloads
/// under one rewritten header.
///
/// All inputs must agree on sample rate, channel count and bit depth;
/// mismatched inputs would sound wrong after concatenation, so they are
/// rejected instead of silently merged.
pub fn merge_wavs(files: &[Vec<u8>]) -> Result<Vec<u8>, WavError> {
    let first = files.first().ok_or(WavError::NothingToMerge)?;
    let reference = WavHeader::parse(first)?;

    let mut pcm = Vec::new();
    for (index, file) in files.iter().enumerate() {
        let header = WavHeader::parse(file)?;
        if (
            header.sample_rate,
            header.channels,
            header.bits_per_sample,
        ) != (
            reference.sample_rate,
            reference.channels,
            reference.bits_per_sample,
        ) {
            return Err(WavError::FormatMismatch(format!(
                "artifact {} is {}Hz/{}ch/{}bit, expected {}Hz/{}ch/{}bit",
                index,
                header.sample_rate,
                header.channels,
                header.bits_per_sample,
                reference.sample_rate,
                reference.channels,
                reference.bits_per_sample
            )));
        }
        pcm.extend_from_slice(&file[WAV_HEADER_LEN..]);
    }

    Ok(encode_wav(
        &pcm,
        reference.sample_rate,
        reference.channels,
        reference.bits_per_sample,
    ))
}
