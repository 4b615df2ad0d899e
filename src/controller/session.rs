use super::readiness::Readiness;
use crate::channel::{Command, EmbedEvent, InboundMessage, PlaybackChannel};
use crate::config::TimingConfig;
use crate::policy::{CompletionDetector, CompletionLatch, CompletionReason, EarlyStopPolicy};
use crate::video::ResolvedVideo;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};
use url::Url;

pub type SessionId = u64;

/// Invoked once when an auto-advancing session completes
pub type CompletionCallback = Box<dyn FnOnce(CompletionReason) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, task not yet running
    Idle,
    /// Waiting for load + settle before registration
    AwaitingReady,
    /// Registered and polling telemetry
    Polling,
    /// Terminal
    Completed,
}

/// Observable view of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub duration: Option<f64>,
    pub current_time: Option<f64>,
    pub completion: Option<CompletionReason>,
    /// Resources released through close or teardown
    pub closed: bool,
}

impl SessionStatus {
    pub fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            duration: None,
            current_time: None,
            completion: None,
            closed: false,
        }
    }
}

/// One video's playback session
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub id: SessionId,
    pub video: ResolvedVideo,
    pub embed_url: Url,
    pub autoplay: bool,
    /// A completion callback was supplied, so the detector is engaged
    pub auto_advance: bool,
    duration: Option<f64>,
    current_time: Option<f64>,
    completion: CompletionLatch,
}

impl PlaybackSession {
    pub fn new(id: SessionId, video: ResolvedVideo, embed_url: Url, autoplay: bool, auto_advance: bool) -> Self {
        Self {
            id,
            video,
            embed_url,
            autoplay,
            auto_advance,
            duration: None,
            current_time: None,
            completion: CompletionLatch::default(),
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn current_time(&self) -> Option<f64> {
        self.current_time
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }

    /// Keep the first positive duration. Returns true if it was recorded now.
    fn record_duration(&mut self, duration: f64) -> bool {
        if self.duration.is_some() || !(duration > 0.0) {
            return false;
        }
        self.duration = Some(duration);
        true
    }
}

/// The task that owns a session's timers and listener.
///
/// Every transition happens inside `run`'s loop, so the completed flag is
/// always checked and set within one turn.
pub(crate) struct SessionTask {
    session: PlaybackSession,
    channel: PlaybackChannel,
    early_stop: EarlyStopPolicy,
    detector: Option<CompletionDetector>,
    on_completed: Option<CompletionCallback>,
    timing: TimingConfig,
    events: mpsc::UnboundedReceiver<EmbedEvent>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl SessionTask {
    pub(crate) fn new(
        session: PlaybackSession,
        channel: PlaybackChannel,
        on_completed: Option<CompletionCallback>,
        timing: TimingConfig,
        events: mpsc::UnboundedReceiver<EmbedEvent>,
        status: Arc<watch::Sender<SessionStatus>>,
    ) -> Self {
        let early_stop = EarlyStopPolicy::new(session.video.end_offset);
        let detector = on_completed
            .is_some()
            .then(|| CompletionDetector::new(timing.completion_timeout()));

        Self {
            session,
            channel,
            early_stop,
            detector,
            on_completed,
            timing,
            events,
            status,
        }
    }

    pub(crate) async fn run(mut self) {
        let started = Instant::now();
        let settle = self.timing.settle_delay();
        let mut readiness = Readiness::new(started, self.timing.load_fallback());
        let mut autoplay_at = self
            .session
            .autoplay
            .then(|| started + self.timing.autoplay_delay());
        let fallback_at = self.detector.map(|detector| started + detector.timeout());
        let mut telemetry_poll: Option<Interval> = None;
        let mut state_poll: Option<Interval> = None;

        self.set_state(SessionState::AwaitingReady);
        debug!("🎬 Session {} awaiting embed readiness", self.session.id);

        while !self.session.is_completed() {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(EmbedEvent::Loaded) => {
                        if readiness.on_load(Instant::now(), settle) {
                            debug!("Session {} embed loaded, settling", self.session.id);
                        }
                    }
                    Some(EmbedEvent::Message(message)) => self.handle_message(&message),
                    None => break,
                },
                _ = sleep_until_opt(readiness.deadline()) => {
                    if readiness.on_deadline(Instant::now(), settle) {
                        self.channel.register();
                        telemetry_poll = Some(poll_interval(self.timing.telemetry_poll()));
                        if self.detector.is_some() {
                            state_poll = Some(poll_interval(self.timing.state_poll()));
                        }
                        self.set_state(SessionState::Polling);
                        debug!("📡 Session {} registered, polling", self.session.id);
                    }
                }
                _ = sleep_until_opt(autoplay_at) => {
                    autoplay_at = None;
                    self.channel.send(Command::Play);
                }
                _ = sleep_until_opt(fallback_at) => {
                    self.complete(CompletionReason::Timeout);
                }
                _ = tick_opt(&mut telemetry_poll) => {
                    if self.session.duration().is_none() {
                        self.channel.send(Command::GetDuration);
                    } else {
                        self.channel.send(Command::GetCurrentTime);
                    }
                }
                _ = tick_opt(&mut state_poll) => {
                    self.channel.send(Command::GetPlayerState);
                }
            }
        }

        debug!("Session {} task finished", self.session.id);
    }

    fn handle_message(&mut self, message: &InboundMessage) {
        let Some(update) = self.channel.accept(message) else {
            return;
        };

        if let Some(duration) = update.duration {
            if self.session.record_duration(duration) {
                debug!("⏱️ Session {} duration {}s", self.session.id, duration);
            }
        }

        if let Some(current_time) = update.current_time {
            self.session.current_time = Some(current_time);
            if self.early_stop.should_stop(self.session.duration(), current_time) {
                self.complete(CompletionReason::EarlyStop);
            }
        }

        if let Some(detector) = self.detector {
            if detector.is_ended_signal(&update) {
                self.complete(CompletionReason::EndedSignal);
            }
        }

        let (duration, current_time) = (self.session.duration(), self.session.current_time());
        self.status.send_modify(|status| {
            status.duration = duration;
            status.current_time = current_time;
        });
    }

    fn complete(&mut self, reason: CompletionReason) {
        if !self.session.completion.try_complete(reason) {
            return;
        }

        if reason == CompletionReason::EarlyStop {
            self.channel.send(Command::Pause);
        }

        info!(
            "✅ Session {} ({}) completed: {:?}",
            self.session.id, self.session.video.title, reason
        );

        self.status.send_modify(|status| {
            status.state = SessionState::Completed;
            status.completion = Some(reason);
        });

        if let Some(on_completed) = self.on_completed.take() {
            on_completed(reason);
        }
    }

    fn set_state(&self, state: SessionState) {
        self.status.send_modify(|status| {
            if status.state != SessionState::Completed {
                status.state = state;
            }
        });
    }
}

/// Zero periods tick every millisecond instead
fn poll_interval(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn tick_opt(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}
