/// Message exchange with an embedded third-party player
///
/// The embed lives in an isolated context. Commands go out as posted JSON
/// envelopes; telemetry comes back as messages that must be filtered by
/// origin and parsed leniently. Everything here is best-effort: failed
/// posts and unreadable messages are dropped, never surfaced.

pub mod message;
pub mod origin;
pub mod transport;

pub use message::{
    parse_payload, Command, InboundMessage, InboundPayload, InboundUpdate, OutboundMessage,
    PlayerState,
};
pub use origin::OriginPolicy;
pub use transport::{EmbedEvent, EmbedEvents, EmbedFrame, EmbedHost, EmbedRequest};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Target origin for outbound posts; the embed itself is the boundary on send
pub const ANY_ORIGIN: &str = "*";

/// Outbound command channel plus inbound filter for one embed
pub struct PlaybackChannel {
    frame: Arc<dyn EmbedFrame>,
    origins: OriginPolicy,
    page_reference: String,
    closed: Arc<AtomicBool>,
}

impl PlaybackChannel {
    pub fn new(
        frame: Arc<dyn EmbedFrame>,
        origins: OriginPolicy,
        page_reference: impl Into<String>,
        closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            frame,
            origins,
            page_reference: page_reference.into(),
            closed,
        }
    }

    /// Send a command. Returns whether the post went out.
    pub fn send(&self, command: Command) -> bool {
        self.post(OutboundMessage::Command(command))
    }

    /// Send the `listening` registration that unlocks inbound telemetry
    pub fn register(&self) -> bool {
        self.post(OutboundMessage::Listening {
            page_reference: self.page_reference.clone(),
        })
    }

    fn post(&self, message: OutboundMessage) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            trace!("Channel closed, dropping {:?}", message);
            return false;
        }

        match self.frame.post_message(&message.to_json(), ANY_ORIGIN) {
            Ok(()) => true,
            Err(e) => {
                debug!("Ignoring failed post {:?}: {}", message, e);
                false
            }
        }
    }

    /// Filter and parse an inbound message
    pub fn accept(&self, message: &InboundMessage) -> Option<InboundUpdate> {
        if !self.origins.is_trusted(&message.origin) {
            trace!("Discarding message from untrusted origin {}", message.origin);
            return None;
        }
        parse_payload(&message.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::error::{PlayerError, Result};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingFrame {
        posts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl EmbedFrame for RecordingFrame {
        fn post_message(&self, message: &str, target_origin: &str) -> Result<()> {
            assert_eq!(target_origin, ANY_ORIGIN);
            if self.fail {
                return Err(PlayerError::Transport("embed torn down".to_string()));
            }
            self.posts.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn channel(frame: Arc<RecordingFrame>, closed: Arc<AtomicBool>) -> PlaybackChannel {
        let origins = OriginPolicy::from_config(&PlayerConfig::default().embed);
        PlaybackChannel::new(frame, origins, "page", closed)
    }

    #[test]
    fn test_send_and_register() {
        let frame = Arc::new(RecordingFrame::default());
        let channel = channel(frame.clone(), Arc::new(AtomicBool::new(false)));

        assert!(channel.register());
        assert!(channel.send(Command::GetDuration));

        let posts = frame.posts.lock().unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts[0].contains("\"listening\""));
        assert!(posts[1].contains("\"getDuration\""));
    }

    #[test]
    fn test_failed_post_is_swallowed() {
        let frame = Arc::new(RecordingFrame {
            fail: true,
            ..Default::default()
        });
        let channel = channel(frame, Arc::new(AtomicBool::new(false)));
        assert!(!channel.send(Command::Play));
    }

    #[test]
    fn test_closed_channel_posts_nothing() {
        let frame = Arc::new(RecordingFrame::default());
        let closed = Arc::new(AtomicBool::new(false));
        let channel = channel(frame.clone(), closed.clone());

        closed.store(true, Ordering::SeqCst);
        assert!(!channel.send(Command::Pause));
        assert!(frame.posts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_accept_filters_origin() {
        let frame = Arc::new(RecordingFrame::default());
        let channel = channel(frame, Arc::new(AtomicBool::new(false)));
        let payload = r#"{"event":"infoDelivery","info":{"duration":30}}"#;

        let trusted = InboundMessage::new("https://www.youtube.com", payload);
        assert_eq!(channel.accept(&trusted).and_then(|u| u.duration), Some(30.0));

        let untrusted = InboundMessage::new("https://ads.example", payload);
        assert!(channel.accept(&untrusted).is_none());
    }
}
