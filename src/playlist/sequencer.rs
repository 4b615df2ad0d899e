use crate::error::{PlayerError, Result};
use crate::video::{same_video, VideoDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistMode {
    /// Browsing a category listing one video at a time
    Single,
    /// Two exercises back to back
    Superset,
    /// Three or more exercises back to back
    Circuit,
}

impl PlaylistMode {
    /// Superset and circuit sequences autoplay and auto-advance
    pub fn is_sequence(&self) -> bool {
        matches!(self, PlaylistMode::Superset | PlaylistMode::Circuit)
    }
}

impl fmt::Display for PlaylistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistMode::Single => write!(f, "Single"),
            PlaylistMode::Superset => write!(f, "Superset"),
            PlaylistMode::Circuit => write!(f, "Circuit"),
        }
    }
}

impl FromStr for PlaylistMode {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(PlaylistMode::Single),
            "superset" => Ok(PlaylistMode::Superset),
            "circuit" => Ok(PlaylistMode::Circuit),
            other => Err(PlayerError::InvalidPlaylist(format!("unknown mode {}", other))),
        }
    }
}

/// Ordered videos for one viewing session plus the current position
#[derive(Debug, Clone)]
pub struct Playlist {
    mode: PlaylistMode,
    videos: Vec<VideoDescriptor>,
    index: usize,
}

impl Playlist {
    /// Build a playlist, checking the entry count against the mode
    pub fn new(mode: PlaylistMode, videos: Vec<VideoDescriptor>) -> Result<Self> {
        let count = videos.len();
        let valid = match mode {
            PlaylistMode::Single => count >= 1,
            PlaylistMode::Superset => count == 2,
            PlaylistMode::Circuit => count >= 3,
        };
        if !valid {
            return Err(PlayerError::InvalidPlaylist(format!(
                "{} needs {}, got {} videos",
                mode,
                match mode {
                    PlaylistMode::Single => "at least 1",
                    PlaylistMode::Superset => "exactly 2",
                    PlaylistMode::Circuit => "at least 3",
                },
                count
            )));
        }

        Ok(Self {
            mode,
            videos,
            index: 0,
        })
    }

    pub fn superset(videos: Vec<VideoDescriptor>) -> Result<Self> {
        Self::new(PlaylistMode::Superset, videos)
    }

    pub fn circuit(videos: Vec<VideoDescriptor>) -> Result<Self> {
        Self::new(PlaylistMode::Circuit, videos)
    }

    /// Single-mode playlist over a listing, positioned on `selected`
    pub fn single(listing: Vec<VideoDescriptor>, selected: &VideoDescriptor) -> Result<Self> {
        let index = listing
            .iter()
            .position(|video| same_video(video, selected))
            .ok_or_else(|| {
                PlayerError::InvalidPlaylist(format!("\"{}\" is not in the listing", selected.title))
            })?;
        let mut playlist = Self::new(PlaylistMode::Single, listing)?;
        playlist.index = index;
        Ok(playlist)
    }

    pub fn mode(&self) -> PlaylistMode {
        self.mode
    }

    pub fn videos(&self) -> &[VideoDescriptor] {
        &self.videos
    }

    /// Never zero, `new` rejects empty lists
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to `index`, clamped to the playlist bounds
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.videos.len().saturating_sub(1));
    }

    pub fn current(&self) -> &VideoDescriptor {
        &self.videos[self.index]
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.videos.len()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Step forward. Returns false at the end.
    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Step back. Returns false at the start.
    pub fn retreat(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// "Exercise 2 of 3"
    pub fn position_label(&self) -> String {
        format!("Exercise {} of {}", self.index + 1, self.videos.len())
    }
}
