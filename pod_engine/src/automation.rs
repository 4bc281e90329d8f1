use serde::{Deserialize, Serialize};

use crate::Time;

/// Gain reported for a track that has no keyframes at all.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// A (time, gain) control point on a track's piecewise-linear automation
/// curve. Times are in seconds from the start of the project.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: Time,
    pub volume: f32,
}

impl Keyframe {
    pub fn new(time: Time, volume: f32) -> Self {
        Keyframe { time, volume }
    }
}

/// Sorts keyframes ascending by time. The sort is stable, so keyframes that
/// share a timestamp keep their list order and the earlier entry wins at the
/// exact instant when evaluated.
pub(crate) fn sort_keyframes(keyframes: &mut [Keyframe]) {
    keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// Evaluates the automation curve at time `t`. `keyframes` must be sorted
/// ascending by time.
///
/// Outside the curve the nearest keyframe's volume is held flat; between two
/// keyframes the volume is linearly interpolated. Both the live scheduler and
/// the offline renderer go through this one function, so preview and export
/// agree exactly.
pub fn volume_at(keyframes: &[Keyframe], t: Time) -> f32 {
    if keyframes.is_empty() {
        return DEFAULT_VOLUME;
    }

    match keyframes.iter().position(|kf| kf.time >= t) {
        None => keyframes[keyframes.len() - 1].volume,
        Some(0) => keyframes[0].volume,
        Some(i) => {
            let prev = keyframes[i - 1];
            let next = keyframes[i];

            if next.time == prev.time {
                // Zero-width segment, no division below.
                return prev.volume;
            }

            let ratio = ((t - prev.time) / (next.time - prev.time)) as f32;
            prev.volume + (next.volume - prev.volume) * ratio
        }
    }
}
