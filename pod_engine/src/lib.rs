mod automation;
mod clip;
mod out;
mod player;
mod project;
mod render;
mod session;
mod track;
mod wav;

pub use automation::{volume_at, Keyframe, DEFAULT_VOLUME};
pub use clip::{Clip, ClipError};
pub use out::{AudioOut, CpalOut, LiveSource, OutError};
pub use player::{PlaybackState, Player};
pub use project::{Project, MIN_DURATION};
pub use render::render;
pub use session::{Session, SessionError};
pub use track::{Track, TrackId, FADE_DURATION};
pub use wav::{encode, EncodeError};

pub type Time = f64;  // in seconds
