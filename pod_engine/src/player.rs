use std::sync::Arc;

use crate::automation::{volume_at, Keyframe};
use crate::out::{AudioOut, LiveSource};
use crate::project::Project;
use crate::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// The transport state machine. Maps the output port's engine clock to
/// timeline positions and describes the live graph to the port; it never
/// touches samples itself.
///
/// While `Playing`, the playhead is `now - epoch`, derived from the clock on
/// demand. `position` is only authoritative when not playing; it is written
/// by pause (a snapshot of elapsed time), by seek, and by stop.
pub struct Player<O: AudioOut> {
    out: O,
    state: PlaybackState,
    epoch: Time,
    position: Time,
}

impl<O: AudioOut> Player<O> {
    pub fn new(out: O) -> Self {
        Player {
            out,
            state: PlaybackState::Stopped,
            epoch: 0.0,
            position: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.out.is_ready()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Starts playback from `offset` seconds. Any existing live graph is torn
    /// down first, so at most one playback session exists at a time; resuming
    /// from pause goes through here too and simply rebuilds from the paused
    /// position.
    ///
    /// For every audible track with a clip this schedules one source reading
    /// from `offset`, primed at the automation value for `offset` and with a
    /// ramp per keyframe at or after it. Ramps cannot be retargeted once
    /// scheduled, which is why every transition rebuilds.
    pub fn play(&mut self, project: &Project, offset: Time) {
        if !self.out.is_ready() {
            return;
        }

        let offset = offset.clamp(0.0, project.duration());
        self.out.clear();
        self.out.resume();

        let now = self.out.now();
        self.epoch = now - offset;

        for track in project.audible_tracks() {
            let Some(clip) = track.clip() else {
                continue;
            };

            let mut events = vec![Keyframe::new(
                now,
                volume_at(track.keyframes(), offset) * track.volume,
            )];
            events.extend(
                track
                    .keyframes()
                    .iter()
                    .filter(|kf| kf.time >= offset)
                    .map(|kf| Keyframe::new(self.epoch + kf.time, kf.volume * track.volume)),
            );

            self.out.start_source(LiveSource {
                clip: Arc::clone(clip),
                started_at: now,
                clip_offset: offset,
                events,
            });
        }

        self.state = PlaybackState::Playing;
    }

    /// Suspends the clock and snapshots the elapsed time as the new
    /// authoritative position. No-op unless playing.
    pub fn pause(&mut self) {
        if !self.out.is_ready() || self.state != PlaybackState::Playing {
            return;
        }

        self.position = self.out.now() - self.epoch;
        self.out.suspend();
        self.state = PlaybackState::Paused;
    }

    /// Moves the playhead. The live graph is torn down either way; if the
    /// transport was playing it is rebuilt from the new offset, discarding
    /// every previously scheduled ramp.
    pub fn seek(&mut self, project: &Project, t: Time) {
        if !self.out.is_ready() {
            return;
        }

        let t = t.clamp(0.0, project.duration());
        let was_playing = self.state == PlaybackState::Playing;

        self.out.clear();
        self.position = t;

        if was_playing {
            self.play(project, t);
        }
    }

    pub fn stop(&mut self) {
        if !self.out.is_ready() {
            return;
        }

        self.out.clear();
        self.out.suspend();
        self.position = 0.0;
        self.state = PlaybackState::Stopped;
    }

    /// The current playhead in seconds. A polling read; advisory only.
    pub fn position(&self) -> Time {
        match self.state {
            PlaybackState::Playing => self.out.now() - self.epoch,
            _ => self.position,
        }
    }
}
