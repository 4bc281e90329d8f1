use std::path::Path;

use crate::clip::{Clip, ClipError};
use crate::out::{AudioOut, CpalOut};
use crate::player::{PlaybackState, Player};
use crate::project::Project;
use crate::render::render;
use crate::track::TrackId;
use crate::wav::{encode, EncodeError};
use crate::Time;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("audio engine is not ready")]
    NotReady,

    #[error("no such track: {0:?}")]
    UnknownTrack(TrackId),

    #[error(transparent)]
    ClipError(#[from] ClipError),

    #[error(transparent)]
    EncodeError(#[from] EncodeError),
}

/// Ties a project to a transport. This is the whole surface a front-end
/// needs: clip loading, transport commands, position polling, and export.
pub struct Session<O: AudioOut = CpalOut> {
    pub project: Project,
    player: Player<O>,
}

impl Session<CpalOut> {
    /// A session against the default audio output device. If no device is
    /// available the session still constructs; the transport is inert and
    /// export is rejected until readiness (which, here, means never).
    pub fn with_default_output() -> Self {
        Session::new(Project::new(), CpalOut::new())
    }
}

impl<O: AudioOut> Session<O> {
    pub fn new(project: Project, out: O) -> Self {
        Session {
            project,
            player: Player::new(out),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.player.is_ready()
    }

    pub fn state(&self) -> PlaybackState {
        self.player.state()
    }

    /// Decodes `bytes` and attaches the clip to the track. Decode failure is
    /// recoverable: the track's clip stays unset and nothing else changes.
    pub fn load_clip(&mut self, id: TrackId, bytes: &[u8]) -> Result<(), SessionError> {
        let clip = Clip::decode(bytes)?;
        log::info!(
            "loaded clip onto track {}: {:.2}s, {} channel(s) at {} Hz",
            id.0,
            clip.duration(),
            clip.channel_count(),
            clip.sample_rate(),
        );

        let track = self
            .project
            .track_mut(id)
            .ok_or(SessionError::UnknownTrack(id))?;
        track.set_clip(clip);
        Ok(())
    }

    pub fn load_clip_file(&mut self, id: TrackId, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let clip = Clip::load_wav(path)?;
        let track = self
            .project
            .track_mut(id)
            .ok_or(SessionError::UnknownTrack(id))?;
        track.set_clip(clip);
        Ok(())
    }

    pub fn play(&mut self, offset: Time) {
        self.player.play(&self.project, offset);
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    pub fn seek(&mut self, t: Time) {
        self.player.seek(&self.project, t);
    }

    pub fn stop(&mut self) {
        self.player.stop();
    }

    /// The playhead clamped to the timeline. Poll-only; never drives
    /// scheduling.
    pub fn position(&self) -> Time {
        self.player.position().clamp(0.0, self.project.duration())
    }

    /// Renders the whole timeline through the offline path and encodes it as
    /// a WAV byte stream. Reads only project data, so exporting while the
    /// transport plays is safe. Rejected outright when the engine is not
    /// ready; no partial artifact is ever produced.
    pub fn export_mix(&self) -> Result<Vec<u8>, SessionError> {
        if !self.is_ready() {
            return Err(SessionError::NotReady);
        }

        let duration = self.project.duration();
        let sample_rate = self.project.sample_rate;
        log::info!("exporting {duration:.2}s mix at {sample_rate} Hz");

        let buf = render(&self.project, duration, sample_rate);
        Ok(encode(&buf, sample_rate, 2)?)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::out::fake::FakeOut;
    use crate::track::Track;

    fn session() -> Session<FakeOut> {
        let mut project = Project::new();
        project.sample_rate = 100;
        project.add_track(Track::new("test"));
        Session::new(project, FakeOut::new())
    }

    fn tone_wav_bytes() -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(16000i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_load_clip() {
        let mut session = session();
        session.load_clip(TrackId(0), &tone_wav_bytes()).unwrap();

        let track = session.project.track(TrackId(0)).unwrap();
        assert_eq!(track.clip().unwrap().duration(), 1.0);
    }

    #[test]
    fn test_load_clip_decode_failure_leaves_track_untouched() {
        let mut session = session();
        let result = session.load_clip(TrackId(0), b"definitely not audio");

        assert!(matches!(result, Err(SessionError::ClipError(_))));
        assert!(session.project.track(TrackId(0)).unwrap().clip().is_none());
    }

    #[test]
    fn test_load_clip_unknown_track() {
        let mut session = session();
        let result = session.load_clip(TrackId(9), &tone_wav_bytes());
        assert!(matches!(result, Err(SessionError::UnknownTrack(_))));
    }

    #[test]
    fn test_export_rejected_when_not_ready() {
        let session = Session::new(Project::new(), FakeOut::unavailable());
        assert!(matches!(session.export_mix(), Err(SessionError::NotReady)));
    }

    #[test]
    fn test_export_produces_decodable_wav_of_project_duration() {
        let mut session = session();
        session.load_clip(TrackId(0), &tone_wav_bytes()).unwrap();

        let bytes = session.export_mix().unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();

        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 100);
        // Duration floor: 5 minutes at 100 Hz.
        assert_eq!(reader.duration(), 30000);
    }

    #[test]
    fn test_export_safe_while_playing() {
        let mut session = session();
        session.load_clip(TrackId(0), &tone_wav_bytes()).unwrap();

        session.play(0.0);
        let bytes = session.export_mix().unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(session.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_position_clamped_to_timeline() {
        let mut session = session();
        session.seek(1e12);
        assert_eq!(session.position(), session.project.duration());
    }
}
