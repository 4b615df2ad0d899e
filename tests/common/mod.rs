#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use workout_player::channel::{EmbedEvents, EmbedFrame, EmbedHost, EmbedRequest, InboundMessage};
use workout_player::controller::CompletionCallback;
use workout_player::error::{PlayerError, Result};
use workout_player::policy::CompletionReason;

pub const TRUSTED_ORIGIN: &str = "https://www.youtube.com";

/// A message posted into an embed, stamped with time since the host was built
#[derive(Debug, Clone)]
pub struct Posted {
    pub session_id: u64,
    pub at: Duration,
    pub message: Value,
}

impl Posted {
    /// `listening` for the registration, otherwise the command's function name
    pub fn name(&self) -> String {
        match self.message["event"].as_str() {
            Some("command") => self.message["func"].as_str().unwrap_or_default().to_string(),
            Some(event) => event.to_string(),
            None => String::new(),
        }
    }
}

/// Embed host that mounts frames recording every post
pub struct RecordingHost {
    started: Instant,
    posts: Arc<Mutex<Vec<Posted>>>,
    mounts: Mutex<Vec<EmbedRequest>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            posts: Arc::new(Mutex::new(Vec::new())),
            mounts: Mutex::new(Vec::new()),
        })
    }

    pub fn mounts(&self) -> Vec<EmbedRequest> {
        self.mounts.lock().unwrap().clone()
    }

    pub fn posts(&self, session_id: u64) -> Vec<Posted> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|posted| posted.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn count(&self, session_id: u64, name: &str) -> usize {
        self.posts(session_id).iter().filter(|p| p.name() == name).count()
    }

    pub fn first_at(&self, session_id: u64, name: &str) -> Option<Duration> {
        self.posts(session_id)
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.at)
    }

    pub fn last_at(&self, session_id: u64) -> Option<Duration> {
        self.posts(session_id).last().map(|p| p.at)
    }
}

struct RecordingFrame {
    session_id: u64,
    started: Instant,
    posts: Arc<Mutex<Vec<Posted>>>,
}

impl EmbedFrame for RecordingFrame {
    fn post_message(&self, message: &str, _target_origin: &str) -> Result<()> {
        let message: Value = serde_json::from_str(message)?;
        self.posts
            .lock()
            .map_err(|_| PlayerError::Transport("poisoned".to_string()))?
            .push(Posted {
                session_id: self.session_id,
                at: Instant::now().duration_since(self.started),
                message,
            });
        Ok(())
    }
}

#[async_trait]
impl EmbedHost for RecordingHost {
    async fn mount(&self, request: &EmbedRequest, _events: EmbedEvents) -> Result<Arc<dyn EmbedFrame>> {
        self.mounts.lock().unwrap().push(request.clone());
        Ok(Arc::new(RecordingFrame {
            session_id: request.session_id,
            started: self.started,
            posts: self.posts.clone(),
        }))
    }
}

/// Completion callback that records every invocation
pub fn recording_callback() -> (Arc<Mutex<Vec<CompletionReason>>>, CompletionCallback) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = fired.clone();
    let callback: CompletionCallback = Box::new(move |reason| sink.lock().unwrap().push(reason));
    (fired, callback)
}

pub fn info(info: Value) -> InboundMessage {
    InboundMessage::new(TRUSTED_ORIGIN, json!({ "event": "infoDelivery", "info": info }).to_string())
}

pub fn ended() -> InboundMessage {
    InboundMessage::new(TRUSTED_ORIGIN, json!({ "event": "onStateChange", "info": 0 }).to_string())
}

pub fn assert_near(actual: Option<Duration>, expected_ms: u64) {
    let actual = actual.expect("event was never posted").as_millis() as u64;
    assert!(
        actual >= expected_ms && actual <= expected_ms + 5,
        "expected ~{}ms, got {}ms",
        expected_ms,
        actual
    );
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
