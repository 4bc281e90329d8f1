use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use pod_engine::{AudioOut, Keyframe, Project, Session, Track};

/// A JSON description of a mix: one entry per track, each pointing at a WAV
/// file with optional volume, mute/solo flags, keyframes, and fades.
///
/// ```json
/// {
///   "tracks": [
///     { "file": "voice.wav", "name": "Voice", "fade_in": true },
///     { "file": "music.wav", "volume": 0.5,
///       "keyframes": [{ "time": 0.0, "volume": 1.0 },
///                     { "time": 30.0, "volume": 0.2 }] }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub tracks: Vec<TrackSpec>,
}

#[derive(Debug, Deserialize)]
pub struct TrackSpec {
    pub file: PathBuf,
    pub name: Option<String>,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(default)]
    pub fade_in: bool,
    #[serde(default)]
    pub fade_out: bool,
}

fn default_volume() -> f32 {
    1.0
}

impl Manifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;
        Ok(manifest)
    }

    /// Builds a session from the manifest, loading every referenced clip.
    /// Paths are resolved relative to the manifest's own directory.
    pub fn into_session<O: AudioOut>(self, base: &Path, out: O) -> anyhow::Result<Session<O>> {
        let mut session = Session::new(Project::new(), out);

        for spec in self.tracks {
            let name = spec
                .name
                .clone()
                .unwrap_or_else(|| spec.file.display().to_string());

            let mut track = Track::new(name);
            track.volume = spec.volume;
            track.muted = spec.muted;
            track.solo = spec.solo;
            track.set_keyframes(spec.keyframes);

            let id = session.project.add_track(track);

            let path = if spec.file.is_absolute() {
                spec.file.clone()
            } else {
                base.join(&spec.file)
            };
            session
                .load_clip_file(id, &path)
                .with_context(|| format!("failed to load clip {}", path.display()))?;

            let track = session.project.track_mut(id).expect("track was just added");
            if spec.fade_in {
                track.fade_in();
            }
            if spec.fade_out {
                track.fade_out();
            }
        }

        Ok(session)
    }
}
