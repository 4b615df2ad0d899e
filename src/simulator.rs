/// In-process stand-in for the embedded player
///
/// Answers the command protocol the way the real embed does: nothing comes
/// back until `listening` is received, duration/time/state queries are
/// answered with `infoDelivery`, and reaching the end emits an ended state
/// change unless the video is configured not to report it (short-form
/// videos often don't).
use crate::channel::{Command, EmbedEvents, EmbedFrame, EmbedHost, EmbedRequest, InboundMessage, PlayerState};
use crate::error::{PlayerError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

pub const SIMULATED_ORIGIN: &str = "https://www.youtube.com";

/// How a simulated video behaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedVideo {
    /// Total length in seconds
    pub duration: f64,
    /// Whether the ended state is reported on reaching the end
    pub reports_end: bool,
}

impl Default for SimulatedVideo {
    fn default() -> Self {
        Self {
            duration: 30.0,
            reports_end: true,
        }
    }
}

/// Mounts [`SimulatedFrame`]s
pub struct SimulatedHost {
    load_delay: Duration,
    default_video: SimulatedVideo,
    videos: HashMap<String, SimulatedVideo>,
    viewer_presses_play: bool,
    mounted: Mutex<Vec<EmbedRequest>>,
}

impl SimulatedHost {
    pub fn new(default_video: SimulatedVideo) -> Self {
        Self {
            load_delay: Duration::from_millis(200),
            default_video,
            videos: HashMap::new(),
            viewer_presses_play: false,
            mounted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Override behaviour for one video identifier
    pub fn with_video(mut self, video_id: impl Into<String>, video: SimulatedVideo) -> Self {
        self.videos.insert(video_id.into(), video);
        self
    }

    /// Start playback on load, as if the viewer tapped play
    pub fn with_viewer_play(mut self, enabled: bool) -> Self {
        self.viewer_presses_play = enabled;
        self
    }

    /// Every embed mounted so far
    pub fn mounted(&self) -> Vec<EmbedRequest> {
        self.mounted
            .lock()
            .map(|mounted| mounted.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmbedHost for SimulatedHost {
    async fn mount(&self, request: &EmbedRequest, events: EmbedEvents) -> Result<Arc<dyn EmbedFrame>> {
        let video = self
            .videos
            .get(&request.video_id)
            .copied()
            .unwrap_or(self.default_video);
        let start = request
            .src
            .query_pairs()
            .find(|(key, _)| key == "start")
            .and_then(|(_, value)| value.parse::<f64>().ok())
            .unwrap_or(0.0);

        let frame = Arc::new(SimulatedFrame::new(video, start, events));

        if let Ok(mut mounted) = self.mounted.lock() {
            mounted.push(request.clone());
        }
        debug!("🧪 Mounted simulated embed {} for {}", request.src, request.title);

        let loader = frame.clone();
        let load_delay = self.load_delay;
        let viewer_presses_play = self.viewer_presses_play;
        tokio::spawn(async move {
            tokio::time::sleep(load_delay).await;
            loader.on_loaded(viewer_presses_play);
        });

        Ok(frame)
    }
}

#[derive(Debug)]
struct PlaybackClock {
    position: f64,
    playing_since: Option<Instant>,
    registered: bool,
    ended_reported: bool,
}

/// A simulated embed with a playback clock
pub struct SimulatedFrame {
    video: SimulatedVideo,
    events: EmbedEvents,
    clock: Mutex<PlaybackClock>,
}

impl SimulatedFrame {
    pub fn new(video: SimulatedVideo, start: f64, events: EmbedEvents) -> Self {
        Self {
            video,
            events,
            clock: Mutex::new(PlaybackClock {
                position: start.min(video.duration),
                playing_since: None,
                registered: false,
                ended_reported: false,
            }),
        }
    }

    fn on_loaded(&self, start_playing: bool) {
        if start_playing {
            if let Ok(mut clock) = self.clock.lock() {
                clock.playing_since = Some(Instant::now());
            }
        }
        self.events.loaded();
    }

    fn position(&self, clock: &PlaybackClock, now: Instant) -> f64 {
        let elapsed = clock
            .playing_since
            .map(|since| now.duration_since(since).as_secs_f64())
            .unwrap_or(0.0);
        (clock.position + elapsed).min(self.video.duration)
    }

    fn state(&self, clock: &PlaybackClock, now: Instant) -> PlayerState {
        let at_end = self.position(clock, now) >= self.video.duration;
        match (clock.playing_since, at_end) {
            (_, true) if self.video.reports_end => PlayerState::Ended,
            (Some(_), _) => PlayerState::Playing,
            (None, _) if clock.position > 0.0 => PlayerState::Paused,
            (None, _) => PlayerState::Cued,
        }
    }

    fn reply(&self, clock: &PlaybackClock, info: Value) {
        if clock.registered {
            self.events.deliver(InboundMessage::new(
                SIMULATED_ORIGIN,
                json!({ "event": "infoDelivery", "info": info }).to_string(),
            ));
        }
    }

    fn report_end_once(&self, clock: &mut PlaybackClock, now: Instant) {
        if clock.registered
            && !clock.ended_reported
            && self.state(clock, now) == PlayerState::Ended
        {
            clock.ended_reported = true;
            self.events.deliver(InboundMessage::new(
                SIMULATED_ORIGIN,
                json!({ "event": "onStateChange", "info": PlayerState::Ended.code() }).to_string(),
            ));
        }
    }

    fn run_command(&self, clock: &mut PlaybackClock, command: Command, now: Instant) {
        match command {
            Command::Play => {
                if clock.playing_since.is_none() {
                    clock.playing_since = Some(now);
                }
            }
            Command::Pause => {
                clock.position = self.position(clock, now);
                clock.playing_since = None;
            }
            Command::GetDuration => {
                self.reply(clock, json!({ "duration": self.video.duration }));
            }
            Command::GetCurrentTime => {
                self.reply(clock, json!({ "currentTime": self.position(clock, now) }));
                self.report_end_once(clock, now);
            }
            Command::GetPlayerState => {
                self.reply(clock, json!({ "playerState": self.state(clock, now).code() }));
            }
        }
    }
}

impl EmbedFrame for SimulatedFrame {
    fn post_message(&self, message: &str, _target_origin: &str) -> Result<()> {
        if self.events.is_closed() {
            return Err(PlayerError::Transport("embed detached".to_string()));
        }

        let value: Value = serde_json::from_str(message)?;
        let mut clock = self
            .clock
            .lock()
            .map_err(|_| PlayerError::Transport("simulated clock poisoned".to_string()))?;
        let now = Instant::now();

        match value["event"].as_str() {
            Some("listening") => clock.registered = true,
            Some("command") => {
                if let Some(command) = value["func"].as_str().and_then(Command::from_func_name) {
                    trace!("Simulated embed received {:?}", command);
                    self.run_command(&mut clock, command, now);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{parse_payload, EmbedEvent, OutboundMessage};

    fn post(frame: &SimulatedFrame, message: OutboundMessage) {
        frame.post_message(&message.to_json(), "*").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_until_registered() {
        let (events, mut rx) = EmbedEvents::channel();
        let frame = SimulatedFrame::new(SimulatedVideo::default(), 0.0, events);

        post(&frame, OutboundMessage::Command(Command::GetDuration));
        assert!(rx.try_recv().is_err());

        post(&frame, OutboundMessage::Listening { page_reference: "p".to_string() });
        post(&frame, OutboundMessage::Command(Command::GetDuration));
        match rx.try_recv().unwrap() {
            EmbedEvent::Message(message) => {
                let update = parse_payload(&message.payload).unwrap();
                assert_eq!(update.duration, Some(30.0));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_while_playing() {
        let (events, mut rx) = EmbedEvents::channel();
        let frame = SimulatedFrame::new(SimulatedVideo::default(), 15.0, events);
        post(&frame, OutboundMessage::Listening { page_reference: "p".to_string() });
        post(&frame, OutboundMessage::Command(Command::Play));

        tokio::time::advance(Duration::from_secs(5)).await;
        post(&frame, OutboundMessage::Command(Command::GetCurrentTime));

        let EmbedEvent::Message(message) = rx.try_recv().unwrap() else {
            panic!("expected a message");
        };
        let update = parse_payload(&message.payload).unwrap();
        assert_eq!(update.current_time, Some(20.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_reported_once() {
        let (events, mut rx) = EmbedEvents::channel();
        let video = SimulatedVideo { duration: 10.0, reports_end: true };
        let frame = SimulatedFrame::new(video, 9.0, events);
        post(&frame, OutboundMessage::Listening { page_reference: "p".to_string() });
        post(&frame, OutboundMessage::Command(Command::Play));
        tokio::time::advance(Duration::from_secs(2)).await;

        post(&frame, OutboundMessage::Command(Command::GetCurrentTime));
        post(&frame, OutboundMessage::Command(Command::GetCurrentTime));

        let mut ended = 0;
        while let Ok(EmbedEvent::Message(message)) = rx.try_recv() {
            if parse_payload(&message.payload).and_then(|u| u.player_state) == Some(PlayerState::Ended) {
                ended += 1;
            }
        }
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_detached_frame_rejects_posts() {
        let (events, rx) = EmbedEvents::channel();
        drop(rx);
        let frame = SimulatedFrame::new(SimulatedVideo::default(), 0.0, events);
        assert!(frame.post_message("{}", "*").is_err());
    }
}
