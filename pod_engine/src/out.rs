use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::automation::{volume_at, Keyframe};
use crate::clip::Clip;
use crate::Time;

/// One playing clip in the live graph: where it sits on the engine clock and
/// the gain program scheduled for it.
///
/// `events` holds absolute engine-clock times: a primed value at `started_at`
/// followed by one ramp target per remaining keyframe. Gain between events is
/// the same linear interpolation the offline renderer uses.
pub struct LiveSource {
    pub clip: Arc<Clip>,
    /// Engine-clock time the source starts playing.
    pub started_at: Time,
    /// Seconds into the clip at `started_at`.
    pub clip_offset: Time,
    /// Gain program in absolute engine-clock time, sorted ascending.
    pub events: Vec<Keyframe>,
}

impl LiveSource {
    pub fn gain_at(&self, t: Time) -> f32 {
        volume_at(&self.events, t)
    }

    pub fn frame_at(&self, t: Time) -> (f32, f32) {
        self.clip.frame_at(self.clip_offset + (t - self.started_at))
    }
}

/// The scheduling port: the live engine describes sources and gain ramps to
/// an output host ahead of time instead of mixing samples itself.
///
/// Scheduled ramps cannot be retargeted, so topology changes (seek, audibility
/// toggles) tear the whole graph down via `clear` and rebuild it.
pub trait AudioOut {
    /// Whether an output device was acquired. When false, every other call is
    /// a no-op and the transport stays inert.
    fn is_ready(&self) -> bool;

    /// The engine clock, in seconds. Frozen while suspended, otherwise
    /// monotone; never reset.
    fn now(&self) -> Time;

    /// Adds a source to the live graph. Playback begins at the source's
    /// `started_at`, which callers set to `now`.
    fn start_source(&mut self, source: LiveSource);

    /// Freezes the clock and silences output. Scheduled ramps stop advancing.
    fn suspend(&mut self);

    fn resume(&mut self);

    /// Stops and drops every live source. Idempotent; runs on every transport
    /// transition, including from `Stopped`.
    fn clear(&mut self);
}

#[derive(thiserror::Error, Debug)]
pub enum OutError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to query output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported output sample format: {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

#[derive(Default)]
struct Shared {
    sources: Mutex<Vec<LiveSource>>,
    suspended: AtomicBool,
    /// Engine clock in frames at the device rate. Advanced by the callback
    /// while not suspended.
    clock_frames: AtomicU64,
}

impl Shared {
    fn write_block<T>(&self, output: &mut [T], channels: usize, sample_rate: u32)
    where
        T: cpal::Sample + cpal::FromSample<f32>,
    {
        if self.suspended.load(Ordering::Relaxed) {
            output.fill(T::EQUILIBRIUM);
            return;
        }

        let frames = (output.len() / channels) as u64;
        let start = self.clock_frames.fetch_add(frames, Ordering::Relaxed);
        let sources = self.sources.lock().unwrap();

        for (i, frame) in output.chunks_mut(channels).enumerate() {
            let t = (start + i as u64) as Time / sample_rate as Time;

            let mut left = 0.0f32;
            let mut right = 0.0f32;
            for source in sources.iter() {
                let (l, r) = source.frame_at(t);
                let gain = source.gain_at(t);
                left += l * gain;
                right += r * gain;
            }

            left = left.clamp(-1.0, 1.0);
            right = right.clamp(-1.0, 1.0);

            if channels == 1 {
                frame[0] = T::from_sample(0.5 * (left + right));
            } else {
                frame[0] = T::from_sample(left);
                frame[1] = T::from_sample(right);
                for sample in &mut frame[2..] {
                    *sample = T::EQUILIBRIUM;
                }
            }
        }
    }
}

/// Real output backed by the default cpal device. If no device or stream can
/// be acquired the port degrades to a permanently not-ready state instead of
/// failing construction.
pub struct CpalOut {
    shared: Arc<Shared>,
    sample_rate: u32,
    _stream: Option<cpal::Stream>,
}

impl CpalOut {
    pub fn new() -> Self {
        match Self::open() {
            Ok(out) => out,
            Err(e) => {
                log::warn!("audio output unavailable, transport disabled: {e}");
                CpalOut {
                    shared: Arc::new(Shared::default()),
                    sample_rate: 44100,
                    _stream: None,
                }
            }
        }
    }

    pub fn open() -> Result<Self, OutError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutError::NoDevice)?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;

        let shared = Arc::new(Shared::default());

        let stream = match sample_format {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, &shared)?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, &shared)?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, &shared)?,
            format => return Err(OutError::UnsupportedSampleFormat(format)),
        };

        stream.play()?;
        log::debug!("audio output open at {sample_rate} Hz");

        Ok(CpalOut {
            shared,
            sample_rate,
            _stream: Some(stream),
        })
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        shared: &Arc<Shared>,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        let shared = Arc::clone(shared);

        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                shared.write_block(data, channels, sample_rate);
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )
    }
}

impl Default for CpalOut {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOut for CpalOut {
    fn is_ready(&self) -> bool {
        self._stream.is_some()
    }

    fn now(&self) -> Time {
        self.shared.clock_frames.load(Ordering::Relaxed) as Time / self.sample_rate as Time
    }

    fn start_source(&mut self, source: LiveSource) {
        self.shared.sources.lock().unwrap().push(source);
    }

    fn suspend(&mut self) {
        self.shared.suspended.store(true, Ordering::Relaxed);
    }

    fn resume(&mut self) {
        self.shared.suspended.store(false, Ordering::Relaxed);
    }

    fn clear(&mut self) {
        self.shared.sources.lock().unwrap().clear();
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_live_source_gain_follows_events() {
        let source = LiveSource {
            clip: Arc::new(Clip::new(vec![vec![1.0; 800]], 100)),
            started_at: 10.0,
            clip_offset: 0.0,
            events: vec![Keyframe::new(10.0, 0.0), Keyframe::new(12.0, 1.0)],
        };

        assert_eq!(source.gain_at(10.0), 0.0);
        assert_eq!(source.gain_at(11.0), 0.5);
        assert_eq!(source.gain_at(13.0), 1.0); // held after the last ramp
    }

    #[test]
    fn test_live_source_silent_before_start() {
        let source = LiveSource {
            clip: Arc::new(Clip::new(vec![vec![1.0; 800]], 100)),
            started_at: 10.0,
            clip_offset: 0.0,
            events: vec![Keyframe::new(10.0, 1.0)],
        };

        assert_eq!(source.frame_at(9.5), (0.0, 0.0));
        assert_eq!(source.frame_at(10.5), (1.0, 1.0));
    }

    #[test]
    fn test_live_source_offset_reads_into_clip() {
        let mut data = vec![0.0; 800];
        data[400] = 0.75; // sample at 4.0s
        let source = LiveSource {
            clip: Arc::new(Clip::new(vec![data], 100)),
            started_at: 2.0,
            clip_offset: 4.0,
            events: vec![Keyframe::new(2.0, 1.0)],
        };

        assert_eq!(source.frame_at(2.0), (0.75, 0.75));
    }
}
