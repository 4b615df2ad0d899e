/// Seams between the controller and whatever hosts the embed
use super::message::InboundMessage;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// A mounted embed that accepts posted messages
pub trait EmbedFrame: Send + Sync {
    /// Post a serialized message into the embed. Fire-and-forget.
    fn post_message(&self, message: &str, target_origin: &str) -> Result<()>;
}

/// What to mount for a session
#[derive(Debug, Clone)]
pub struct EmbedRequest {
    pub session_id: u64,
    pub video_id: String,
    pub title: String,
    pub src: Url,
}

/// Mounts embeds. The host pushes load and message events for the new embed
/// into the supplied [`EmbedEvents`].
#[async_trait]
pub trait EmbedHost: Send + Sync {
    async fn mount(&self, request: &EmbedRequest, events: EmbedEvents) -> Result<Arc<dyn EmbedFrame>>;
}

/// Events flowing from the embed to its session
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedEvent {
    /// The embed fired its load signal
    Loaded,
    /// A message posted back by the embed (or anything else on the page)
    Message(InboundMessage),
}

/// Per-session listener registration. Once the session ends, its receiver is
/// gone and further events are dropped.
#[derive(Debug, Clone)]
pub struct EmbedEvents {
    tx: mpsc::UnboundedSender<EmbedEvent>,
}

impl EmbedEvents {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EmbedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Signal that the embed has loaded. Returns false if nobody listens anymore.
    pub fn loaded(&self) -> bool {
        self.tx.send(EmbedEvent::Loaded).is_ok()
    }

    /// Deliver an inbound message. Returns false if nobody listens anymore.
    pub fn deliver(&self, message: InboundMessage) -> bool {
        self.tx.send(EmbedEvent::Message(message)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
