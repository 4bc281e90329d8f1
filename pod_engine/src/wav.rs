use std::io::Cursor;

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("failed to write wav stream: {source}")]
    WriteError {
        #[from]
        source: hound::Error,
    },
}

/// Serializes interleaved f32 samples into an in-memory RIFF/WAVE byte
/// stream: the canonical 44-byte PCM header followed by 16-bit little-endian
/// samples. Output size is `44 + samples.len() * 2`.
pub fn encode(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>, EncodeError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Clamps to [-1, 1] and scales asymmetrically: negative values by 32768,
/// non-negative by 32767, truncating toward zero. This covers the signed
/// 16-bit range exactly and must not be replaced with a symmetric scale.
fn to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_scaling_covers_int16_range() {
        assert_eq!(to_i16(-1.0), -32768);
        assert_eq!(to_i16(1.0), 32767);
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(0.5), 16383); // 16383.5 truncated
        assert_eq!(to_i16(-0.5), -16384);
    }

    #[test]
    fn test_scaling_clamps_out_of_range() {
        assert_eq!(to_i16(2.0), 32767);
        assert_eq!(to_i16(-3.0), -32768);
    }

    #[test]
    fn test_header_round_trip() {
        let samples = vec![0.0f32; 250 * 2];
        let bytes = encode(&samples, 44100, 2).unwrap();

        assert_eq!(bytes.len(), 44 + samples.len() * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        assert_eq!(reader.duration(), 250); // frames per channel
    }

    #[test]
    fn test_samples_round_trip() {
        let bytes = encode(&[-1.0, 1.0, 0.5, -0.25], 8000, 2).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(decoded, [-32768, 32767, 16383, -8192]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let samples = vec![0.1f32, -0.2, 0.3, -0.4];
        assert_eq!(
            encode(&samples, 44100, 2).unwrap(),
            encode(&samples, 44100, 2).unwrap()
        );
    }
}
