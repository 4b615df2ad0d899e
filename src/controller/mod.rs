/// Playback controller: one session per active video
///
/// Opening a session resolves the video, mounts an embed through the
/// [`EmbedHost`], and spawns a task that runs the readiness protocol,
/// polling, autoplay, early stop and completion detection. Closing (or
/// opening the next video, or dropping the controller) tears all of it down.

pub mod readiness;
pub mod session;

pub use readiness::Readiness;
pub use session::{CompletionCallback, PlaybackSession, SessionId, SessionState, SessionStatus};

use crate::channel::{EmbedEvents, EmbedHost, EmbedRequest, InboundMessage, OriginPolicy, PlaybackChannel};
use crate::config::PlayerConfig;
use crate::error::Result;
use crate::video::{embed_url, ResolvedVideo, VideoDescriptor};
use session::SessionTask;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info};
use url::Url;

/// Drives embedded playback for one video at a time
pub struct PlaybackController {
    config: Arc<PlayerConfig>,
    host: Arc<dyn EmbedHost>,
    origins: OriginPolicy,
    active: Option<SessionHandle>,
    next_id: SessionId,
}

impl PlaybackController {
    pub fn new(config: PlayerConfig, host: Arc<dyn EmbedHost>) -> Self {
        let origins = OriginPolicy::from_config(&config.embed);
        Self {
            config: Arc::new(config),
            host,
            origins,
            active: None,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The session currently owned by the controller, if any
    pub fn active(&self) -> Option<&SessionHandle> {
        self.active.as_ref()
    }

    /// Open a session for `video`, closing the previous one first.
    ///
    /// Supplying `on_completed` marks the session as auto-advancing: the
    /// ended-signal/timeout detector is engaged and the callback fires at most
    /// once. An unresolvable URL returns an error and opens nothing.
    pub async fn open_session(
        &mut self,
        video: &VideoDescriptor,
        autoplay: bool,
        on_completed: Option<CompletionCallback>,
    ) -> Result<SessionHandle> {
        self.close_session().await;

        let resolved = video.resolve(&self.config.offsets)?;
        let src = embed_url(
            &self.config.embed.embed_base,
            &resolved.video_id,
            resolved.start_offset,
            resolved.mute,
        )?;

        self.next_id += 1;
        let id = self.next_id;

        let (events, inbox) = EmbedEvents::channel();
        let request = EmbedRequest {
            session_id: id,
            video_id: resolved.video_id.clone(),
            title: resolved.title.clone(),
            src: src.clone(),
        };
        let frame = self.host.mount(&request, events.clone()).await?;

        let closed = Arc::new(AtomicBool::new(false));
        let channel = PlaybackChannel::new(
            frame,
            self.origins.clone(),
            self.config.embed.page_reference.clone(),
            closed.clone(),
        );

        let auto_advance = on_completed.is_some();
        let session = PlaybackSession::new(id, resolved, src, autoplay, auto_advance);
        let (status_tx, _) = watch::channel(SessionStatus::idle());
        let status = Arc::new(status_tx);

        let task = SessionTask::new(
            session.clone(),
            channel,
            on_completed,
            self.config.timing.clone(),
            inbox,
            status.clone(),
        );
        let join = tokio::spawn(task.run());

        info!(
            "▶️ Opened session {} for \"{}\" ({}), autoplay={}, auto_advance={}",
            id, session.video.title, session.video.video_id, autoplay, auto_advance
        );

        let handle = SessionHandle {
            inner: Arc::new(SessionShared {
                session,
                events,
                status,
                closed,
                abort: join.abort_handle(),
                task: Mutex::new(Some(join)),
            }),
        };
        self.active = Some(handle.clone());
        Ok(handle)
    }

    /// Close the active session, if any
    pub async fn close_session(&mut self) {
        if let Some(active) = self.active.take() {
            active.close().await;
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.abort();
        }
    }
}

struct SessionShared {
    session: PlaybackSession,
    events: EmbedEvents,
    status: Arc<watch::Sender<SessionStatus>>,
    closed: Arc<AtomicBool>,
    abort: AbortHandle,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SessionShared {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.abort.abort();
    }
}

/// Cloneable handle to a session. The controller keeps one clone while the
/// session is active; once every clone is gone the session is cancelled.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionShared>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.inner.session.id
    }

    /// The session as resolved at open. Live telemetry is in [`SessionHandle::status`].
    pub fn session(&self) -> &PlaybackSession {
        &self.inner.session
    }

    pub fn video(&self) -> &ResolvedVideo {
        &self.inner.session.video
    }

    pub fn embed_url(&self) -> &Url {
        &self.inner.session.embed_url
    }

    pub fn autoplay(&self) -> bool {
        self.inner.session.autoplay
    }

    pub fn auto_advance(&self) -> bool {
        self.inner.session.auto_advance
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.status.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.inner.status.borrow().state
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Listener registration the embed reports into
    pub fn events(&self) -> EmbedEvents {
        self.inner.events.clone()
    }

    /// Forward the embed's load signal
    pub fn notify_loaded(&self) -> bool {
        self.inner.events.loaded()
    }

    /// Forward a message received from the page
    pub fn deliver(&self, message: InboundMessage) -> bool {
        self.inner.events.deliver(message)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Wait until the session reaches `Completed`, by any path
    pub async fn completed(&self) -> SessionStatus {
        let mut rx = self.subscribe();
        loop {
            {
                let status = rx.borrow_and_update();
                if status.state == SessionState::Completed {
                    return status.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.status();
            }
        }
    }

    /// Cancel every timer and detach the listener. Idempotent. Once this
    /// returns, the session posts nothing more.
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.abort.abort();

        let task = self.inner.task.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
            debug!("Session {} closed", self.id());
        }
        self.mark_closed();
    }

    /// Synchronous teardown for drop paths
    pub(crate) fn abort(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.abort.abort();
        self.mark_closed();
    }

    fn mark_closed(&self) {
        self.inner.status.send_modify(|status| {
            status.state = SessionState::Completed;
            status.closed = true;
        });
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id())
            .field("video_id", &self.video().video_id)
            .field("status", &self.status())
            .finish()
    }
}
