use crate::automation::volume_at;
use crate::project::Project;
use crate::Time;

/// Renders the mix to an interleaved stereo buffer of
/// `duration * sample_rate` frames, off the real-time path.
///
/// Every audible track goes through the same `volume_at` evaluation the live
/// scheduler primes its ramps with, sampled once per output frame, so the
/// export reproduces the live curve rather than stepping between keyframes.
/// Mixing is additive with no normalization; clipping is handled at encode
/// time. Pure function of its arguments: rendering the same project twice
/// yields identical buffers.
pub fn render(project: &Project, duration: Time, sample_rate: u32) -> Vec<f32> {
    let frames = (duration * sample_rate as Time) as usize;
    let mut buf = vec![0.0f32; frames * 2];

    for track in project.audible_tracks() {
        let Some(clip) = track.clip() else {
            continue;
        };

        for frame in 0..frames {
            let t = frame as Time / sample_rate as Time;
            let (left, right) = clip.frame_at(t);
            if left == 0.0 && right == 0.0 {
                continue;
            }

            let gain = volume_at(track.keyframes(), t) * track.volume;
            buf[frame * 2] += left * gain;
            buf[frame * 2 + 1] += right * gain;
        }
    }

    buf
}
