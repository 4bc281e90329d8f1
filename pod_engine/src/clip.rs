use std::io::Cursor;
use std::path::Path;
use std::{fs, io};

use hound::SampleFormat;

use crate::clip::ClipError::ClipReadError;
use crate::Time;

/// A chunk of decoded, per-channel f32 audio. Immutable once decoded; tracks
/// hold clips behind an `Arc` so the live graph can snapshot them without
/// copying sample data.
#[derive(Debug, Clone)]
pub struct Clip {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum ClipError {
    #[error("failed to read audio data: {source}")]
    ClipReadError {
        #[from]
        source: hound::Error,
    },

    #[error("audio data contains no channels")]
    NoChannels,

    #[error(transparent)]
    IoError(#[from] io::Error),
}

impl Clip {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Decodes raw WAV bytes into a clip. 8/16/24/32-bit integer and 32-bit
    /// float samples are accepted; anything else is a recoverable error and
    /// leaves no trace in the project.
    pub fn decode(bytes: &[u8]) -> Result<Self, ClipError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        if spec.channels == 0 {
            return Err(ClipError::NoChannels);
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| ClipReadError { source: e })?,
            SampleFormat::Int => {
                let scale = ((1i64 << spec.bits_per_sample) / 2 - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| ClipReadError { source: e })?
            }
        };

        let mut channels = vec![Vec::new(); spec.channels as usize];
        for (i, sample) in interleaved.into_iter().enumerate() {
            channels[i % spec.channels as usize].push(sample);
        }

        // A truncated final frame would leave the channels uneven.
        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        for channel in &mut channels {
            channel.truncate(frames);
        }

        Ok(Clip::new(channels, spec.sample_rate))
    }

    pub fn load_wav(path: impl AsRef<Path>) -> Result<Self, ClipError> {
        let bytes = fs::read(path)?;
        Self::decode(&bytes)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration(&self) -> Time {
        self.len() as Time / self.sample_rate as Time
    }

    /// The (left, right) frame at time `t` seconds into the clip, or silence
    /// outside it. Mono clips feed both sides; channels past the second are
    /// ignored.
    pub fn frame_at(&self, t: Time) -> (f32, f32) {
        if t < 0.0 {
            return (0.0, 0.0);
        }

        let i = (t * self.sample_rate as Time) as usize;
        if i >= self.len() {
            return (0.0, 0.0);
        }

        match self.channels.len() {
            1 => (self.channels[0][i], self.channels[0][i]),
            _ => (self.channels[0][i], self.channels[1][i]),
        }
    }
}
