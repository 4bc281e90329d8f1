use crate::track::{Track, TrackId};
use crate::Time;

/// Floor for the project duration, 5 minutes. The timeline never reports
/// shorter than this even when every clip is shorter.
pub const MIN_DURATION: Time = 300.0;

/// A set of tracks sharing one timeline. The export sample rate lives here;
/// live playback runs at whatever rate the output device reports.
pub struct Project {
    pub sample_rate: u32,
    tracks: Vec<Track>,
}

impl Project {
    pub fn new() -> Self {
        Project {
            sample_rate: 44100,
            tracks: Vec::new(),
        }
    }

    pub fn add_track(&mut self, track: Track) -> TrackId {
        self.tracks.push(track);
        TrackId(self.tracks.len() - 1)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(id.0)
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(id.0)
    }

    /// Total timeline duration: the longest clip, floored at [`MIN_DURATION`].
    /// Derived on demand, so it is always current after a clip load.
    pub fn duration(&self) -> Time {
        self.tracks
            .iter()
            .filter_map(|t| t.clip())
            .map(|c| c.duration())
            .fold(MIN_DURATION, Time::max)
    }

    /// Tracks that may contribute sound: solo narrows the candidate set to
    /// solo'd tracks, then mute filters within it. Both live playback and
    /// offline render consult this one filter.
    pub fn audible_tracks(&self) -> impl Iterator<Item = &Track> {
        let any_solo = self.tracks.iter().any(|t| t.solo);
        self.tracks
            .iter()
            .filter(move |t| !t.muted && (!any_solo || t.solo))
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clip::Clip;

    #[test]
    fn test_duration_floor() {
        let mut project = Project::new();
        assert_eq!(project.duration(), MIN_DURATION);

        let id = project.add_track(Track::new("short"));
        project
            .track_mut(id)
            .unwrap()
            .set_clip(Clip::new(vec![vec![0.0; 100]], 100));
        assert_eq!(project.duration(), MIN_DURATION);
    }

    #[test]
    fn test_duration_tracks_longest_clip() {
        let mut project = Project::new();
        let a = project.add_track(Track::new("a"));
        let b = project.add_track(Track::new("b"));

        project
            .track_mut(a)
            .unwrap()
            .set_clip(Clip::new(vec![vec![0.0; 400 * 100]], 100));
        project
            .track_mut(b)
            .unwrap()
            .set_clip(Clip::new(vec![vec![0.0; 350 * 100]], 100));

        assert_eq!(project.duration(), 400.0);
    }

    #[test]
    fn test_audibility_no_solo() {
        let mut project = Project::new();
        project.add_track(Track::new("a"));
        let b = project.add_track(Track::new("b"));
        project.track_mut(b).unwrap().muted = true;

        let audible: Vec<&str> = project.audible_tracks().map(|t| t.name.as_str()).collect();
        assert_eq!(audible, ["a"]);
    }

    #[test]
    fn test_solo_narrows_then_mute_filters() {
        let mut project = Project::new();
        project.add_track(Track::new("a"));
        let b = project.add_track(Track::new("b"));
        let c = project.add_track(Track::new("c"));

        project.track_mut(b).unwrap().solo = true;
        project.track_mut(c).unwrap().solo = true;
        project.track_mut(c).unwrap().muted = true;

        let audible: Vec<&str> = project.audible_tracks().map(|t| t.name.as_str()).collect();
        assert_eq!(audible, ["b"]);
    }
}
