/// Sample format of a synthesis provider response, decided once at the
/// provider boundary so downstream code never re-parses descriptor strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleFormat {
    /// Raw linear-PCM samples that still need a container around them.
    RawPcm {
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    },
    /// Already-encoded compressed audio, passed through unchanged.
    Encoded { codec: String },
}

const DEFAULT_SAMPLE_RATE: u32 = 24000;

impl SampleFormat {
    /// Interpret a mime-type-like descriptor reported by the provider,
    /// e.g. `audio/L16;codec=pcm;rate=24000` or `audio/mpeg`.
    ///
    /// Anything carrying a PCM marker is raw samples; the embedded `rate=`
    /// parameter overrides the 24 kHz default. Providers we integrate with
    /// return mono 16-bit samples, so those are fixed here.
    pub fn from_descriptor(descriptor: &str) -> Self {
        let lowered = descriptor.to_ascii_lowercase();

        if lowered.contains("pcm") || lowered.starts_with("audio/l16") {
            let rate_pattern = regex::Regex::new(r"rate=(\d+)").unwrap();
            let sample_rate = rate_pattern
                .captures(&lowered)
                .and_then(|c| c[1].parse().ok())
                .unwrap_or(DEFAULT_SAMPLE_RATE);

            SampleFormat::RawPcm {
                sample_rate,
                channels: 1,
                bits_per_sample: 16,
            }
        } else {
            let codec = lowered
                .split(';')
                .next()
                .unwrap_or(&lowered)
                .trim_start_matches("audio/")
                .to_string();
            SampleFormat::Encoded { codec }
        }
    }

    /// File extension used when the artifact is persisted.
    pub fn extension(&self) -> &'static str {
        match self {
            SampleFormat::RawPcm { .. } => "wav",
            SampleFormat::Encoded { codec } => {
                if codec.contains("ogg") || codec.contains("opus") {
                    "ogg"
                } else {
                    "mp3"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pcm_descriptor_with_rate() {
        let format = SampleFormat::from_descriptor("audio/L16;codec=pcm;rate=24000");
        assert_eq!(
            format,
            SampleFormat::RawPcm {
                sample_rate: 24000,
                channels: 1,
                bits_per_sample: 16
            }
        );
        assert_eq!(format.extension(), "wav");
    }

    #[test]
    fn test_pcm_descriptor_without_rate_defaults_to_24khz() {
        let format = SampleFormat::from_descriptor("audio/pcm");
        assert_eq!(
            format,
            SampleFormat::RawPcm {
                sample_rate: 24000,
                channels: 1,
                bits_per_sample: 16
            }
        );
    }

    #[test]
    fn test_pcm_descriptor_with_custom_rate() {
        let format = SampleFormat::from_descriptor("audio/l16;rate=16000");
        assert!(matches!(
            format,
            SampleFormat::RawPcm {
                sample_rate: 16000,
                ..
            }
        ));
    }

    #[test]
    fn test_encoded_descriptor() {
        let format = SampleFormat::from_descriptor("audio/mpeg");
        assert_eq!(
            format,
            SampleFormat::Encoded {
                codec: "mpeg".to_string()
            }
        );
        assert_eq!(format.extension(), "mp3");
    }

    #[test]
    fn test_encoded_ogg_descriptor() {
        let format = SampleFormat::from_descriptor("audio/ogg;codecs=vorbis");
        assert_eq!(format.extension(), "ogg");
    }
}
