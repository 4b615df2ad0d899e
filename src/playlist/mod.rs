/// Playlists for single, superset and circuit viewing

pub mod driver;
pub mod sequencer;

pub use driver::{SequenceDriver, SequenceStep};
pub use sequencer::{Playlist, PlaylistMode};
