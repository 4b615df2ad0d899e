/// Connects a playlist to the playback controller
use super::sequencer::Playlist;
use crate::controller::{CompletionCallback, PlaybackController, SessionHandle};
use crate::error::{PlayerError, Result};
use crate::policy::CompletionReason;
use tokio::sync::oneshot;
use tracing::info;

/// Outcome of waiting on the active video
#[derive(Debug)]
pub enum SequenceStep {
    /// The video completed and the next one was opened with autoplay
    Advanced {
        index: usize,
        reason: CompletionReason,
        session: SessionHandle,
    },
    /// The video completed and nothing follows
    Finished { reason: Option<CompletionReason> },
    /// The session was torn down before it completed
    Closed,
}

/// Plays a [`Playlist`] through a [`PlaybackController`].
///
/// Auto-advance is only wired for superset/circuit entries that have a
/// successor. User navigation never autoplays.
pub struct SequenceDriver {
    controller: PlaybackController,
    playlist: Playlist,
    pending: Option<oneshot::Receiver<CompletionReason>>,
    /// Completion already received whose advance has not opened yet
    advance_due: Option<CompletionReason>,
}

impl SequenceDriver {
    pub fn new(controller: PlaybackController, playlist: Playlist) -> Self {
        Self {
            controller,
            playlist,
            pending: None,
            advance_due: None,
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn active(&self) -> Option<&SessionHandle> {
        self.controller.active()
    }

    /// "Exercise i of n"
    pub fn position(&self) -> String {
        self.playlist.position_label()
    }

    /// Open the current entry. The first entry of a sequence autoplays.
    pub async fn start(&mut self) -> Result<SessionHandle> {
        let autoplay = self.playlist.mode().is_sequence() && self.playlist.index() == 0;
        info!(
            "🏋️ Starting {} at {}",
            self.playlist.mode(),
            self.playlist.position_label()
        );
        self.open_at(self.playlist.index(), autoplay).await
    }

    /// User "next". Does not autoplay.
    pub async fn next(&mut self) -> Result<Option<SessionHandle>> {
        if !self.playlist.has_next() {
            return Ok(None);
        }
        self.open_at(self.playlist.index() + 1, false).await.map(Some)
    }

    /// User "previous". Does not autoplay.
    pub async fn previous(&mut self) -> Result<Option<SessionHandle>> {
        if !self.playlist.has_previous() {
            return Ok(None);
        }
        self.open_at(self.playlist.index() - 1, false).await.map(Some)
    }

    /// Leave the player
    pub async fn dismiss(&mut self) {
        self.pending = None;
        self.advance_due = None;
        self.controller.close_session().await;
    }

    /// Wait for the active video to complete and react to it.
    ///
    /// Cancel-safe: a completion that arrived before the future was dropped
    /// is kept, and the advance it triggers is retried by the next call. The
    /// playlist position only moves once the next session has opened.
    pub async fn wait_for_completion(&mut self) -> Result<SequenceStep> {
        if let Some(reason) = self.advance_due {
            return self.auto_advance(reason).await;
        }

        let active = self
            .controller
            .active()
            .cloned()
            .ok_or_else(|| PlayerError::InvalidPlaylist("no active session".to_string()))?;

        if let Some(pending) = self.pending.as_mut() {
            let outcome = pending.await;
            self.pending = None;

            return match outcome {
                Ok(reason) if self.playlist.has_next() => {
                    self.advance_due = Some(reason);
                    self.auto_advance(reason).await
                }
                Ok(reason) => Ok(SequenceStep::Finished {
                    reason: Some(reason),
                }),
                Err(_) => Ok(SequenceStep::Closed),
            };
        }

        let status = active.completed().await;
        match status.completion {
            Some(reason) => {
                info!("🏁 {} finished", self.playlist.position_label());
                Ok(SequenceStep::Finished {
                    reason: Some(reason),
                })
            }
            None => Ok(SequenceStep::Closed),
        }
    }

    async fn auto_advance(&mut self, reason: CompletionReason) -> Result<SequenceStep> {
        let index = self.playlist.index() + 1;
        info!(
            "⏭️ Auto-advancing to exercise {} of {}",
            index + 1,
            self.playlist.len()
        );
        let session = self.open_at(index, true).await?;
        Ok(SequenceStep::Advanced {
            index,
            reason,
            session,
        })
    }

    /// Open entry `index`. The position, the pending completion and any due
    /// advance are only updated once the controller call returns.
    async fn open_at(&mut self, index: usize, autoplay: bool) -> Result<SessionHandle> {
        let video = self
            .playlist
            .videos()
            .get(index)
            .cloned()
            .ok_or_else(|| PlayerError::InvalidPlaylist(format!("no entry at {}", index)))?;
        let auto_advance = self.playlist.mode().is_sequence() && index + 1 < self.playlist.len();

        let (on_completed, receiver) = if auto_advance {
            let (tx, rx) = oneshot::channel();
            let callback: CompletionCallback = Box::new(move |reason| {
                let _ = tx.send(reason);
            });
            (Some(callback), Some(rx))
        } else {
            (None, None)
        };

        let opened = self.controller.open_session(&video, autoplay, on_completed).await;

        // Failure still lands on the entry so the caller can show its error
        self.playlist.seek(index);
        self.advance_due = None;
        match opened {
            Ok(session) => {
                self.pending = receiver;
                Ok(session)
            }
            Err(e) => {
                self.pending = None;
                Err(e)
            }
        }
    }
}
