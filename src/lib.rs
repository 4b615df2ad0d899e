/// Workout Player - embedded exercise video playback
///
/// Drives an embedded third-party video player over its cross-frame message
/// protocol: readiness handshake, telemetry polling, early stop before the
/// end screen, completion detection, and superset/circuit auto-advance.

pub mod catalog;
pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod playlist;
pub mod policy;
pub mod simulator;
pub mod video;

// Re-export main types for easy access
pub use crate::catalog::{Catalog, Category, CategoryKind, SubCategory};
pub use crate::channel::{EmbedEvents, EmbedFrame, EmbedHost, EmbedRequest, InboundMessage, PlaybackChannel};
pub use crate::config::PlayerConfig;
pub use crate::controller::{PlaybackController, SessionHandle, SessionState, SessionStatus};
pub use crate::error::{PlayerError, Result};
pub use crate::playlist::{Playlist, PlaylistMode, SequenceDriver, SequenceStep};
pub use crate::policy::{CompletionDetector, CompletionReason, EarlyStopPolicy};
pub use crate::simulator::{SimulatedHost, SimulatedVideo};
pub use crate::video::{extract_id, ResolvedVideo, VideoDescriptor};
