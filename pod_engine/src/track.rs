use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::automation::{sort_keyframes, volume_at, Keyframe};
use crate::clip::Clip;
use crate::Time;

/// Length of the fades produced by [`Track::fade_in`] and [`Track::fade_out`].
pub const FADE_DURATION: Time = 2.0;

/// Identifies a track within its project. Assigned by `Project::add_track`.
#[derive(Debug, Eq, Hash, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct TrackId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub volume: f32,
    pub muted: bool,
    pub solo: bool,
    clip: Option<Arc<Clip>>,
    keyframes: Vec<Keyframe>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Track {
            name: name.into(),
            volume: 1.0,
            muted: false,
            solo: false,
            clip: None,
            keyframes: Vec::new(),
        }
    }

    pub fn clip(&self) -> Option<&Arc<Clip>> {
        self.clip.as_ref()
    }

    /// Replaces the track's clip. The old clip is dropped; any live graph
    /// built from it keeps its own `Arc` until the next rebuild.
    pub fn set_clip(&mut self, clip: Clip) {
        self.clip = Some(Arc::new(clip));
    }

    pub fn clear_clip(&mut self) {
        self.clip = None;
    }

    /// Keyframes, always sorted ascending by time.
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Replaces the whole keyframe sequence. Mutation is wholesale by design:
    /// the evaluator never retains a pointer into a stale sequence.
    pub fn set_keyframes(&mut self, mut keyframes: Vec<Keyframe>) {
        sort_keyframes(&mut keyframes);
        self.keyframes = keyframes;
    }

    /// Inserts a keyframe at `t` whose volume samples the current curve, so
    /// adding a point does not change the curve's shape.
    pub fn add_keyframe_at(&mut self, t: Time) {
        let volume = volume_at(&self.keyframes, t);
        self.keyframes.push(Keyframe::new(t, volume));
        sort_keyframes(&mut self.keyframes);
    }

    /// Removes the keyframe at `index`, if there is one.
    pub fn remove_keyframe(&mut self, index: usize) {
        if index < self.keyframes.len() {
            self.keyframes.remove(index);
        }
    }

    /// Ramps the track from silence up to full volume over the first
    /// [`FADE_DURATION`] seconds of its clip. Keyframes inside the fade window
    /// are replaced; later ones are kept. No-op without a clip.
    pub fn fade_in(&mut self) {
        let Some(clip) = &self.clip else {
            return;
        };

        let end = FADE_DURATION.min(clip.duration());
        self.keyframes.retain(|kf| kf.time > end);
        self.keyframes.push(Keyframe::new(0.0, 0.0));
        self.keyframes.push(Keyframe::new(end, 1.0));
        sort_keyframes(&mut self.keyframes);
    }

    /// Ramps the track from full volume down to silence over the last
    /// [`FADE_DURATION`] seconds of its clip.
    pub fn fade_out(&mut self) {
        let Some(clip) = &self.clip else {
            return;
        };

        let duration = clip.duration();
        let start = (duration - FADE_DURATION).max(0.0);
        self.keyframes.retain(|kf| kf.time < start);
        self.keyframes.push(Keyframe::new(start, 1.0));
        self.keyframes.push(Keyframe::new(duration, 0.0));
        sort_keyframes(&mut self.keyframes);
    }
}
