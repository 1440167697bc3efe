//! Per-stream request issue, supersede, debounce, and timeout machinery.
//!
//! The coordinator owns the only shared coordination state in the session:
//! one current [`RequestRecord`] per stream. Issuing always mints a fresh
//! correlation id and replaces the record in the same step, so there is no
//! window in which two requests are both "current". Timers are spawned
//! one-shot tasks that report back through the session event channel and are
//! aborted on supersede or cancel.

use std::time::Duration;
use std::time::Instant;

use periscope_protocol::OutboundMessage;
use periscope_protocol::RequestId;
use periscope_protocol::StreamKind;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::channel::PanelChannel;
use crate::config::SessionConfig;
use crate::events::SessionEvent;

/// Builds the outbound message once the coordinator has minted the id the
/// request will be tracked under.
pub type PayloadBuilder = Box<dyn FnOnce(&RequestId) -> OutboundMessage + Send>;

/// The stream's current in-flight request.
#[derive(Debug)]
struct RequestRecord {
    id: RequestId,
    issued_at: Instant,
}

#[derive(Default)]
struct StreamSlot {
    current: Option<RequestRecord>,
    /// Last payload sent on this stream, surviving completion so a refresh
    /// push can re-issue it after the response already arrived.
    last_template: Option<OutboundMessage>,
    debounce_task: Option<JoinHandle<()>>,
    trailing: Option<PayloadBuilder>,
    timeout_task: Option<JoinHandle<()>>,
}

impl StreamSlot {
    fn close_window(&mut self) {
        if let Some(task) = self.debounce_task.take() {
            task.abort();
        }
        self.trailing = None;
    }

    fn disarm_timeout(&mut self) {
        if let Some(task) = self.timeout_task.take() {
            task.abort();
        }
    }
}

pub struct RequestCoordinator {
    channel: PanelChannel,
    events: UnboundedSender<SessionEvent>,
    debounce_window: Duration,
    request_timeout: Option<Duration>,
    data_fetch: StreamSlot,
    vector_search: StreamSlot,
}

impl RequestCoordinator {
    pub fn new(
        channel: PanelChannel,
        events: UnboundedSender<SessionEvent>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            channel,
            events,
            debounce_window: config.debounce_window,
            request_timeout: config.request_timeout,
            data_fetch: StreamSlot::default(),
            vector_search: StreamSlot::default(),
        }
    }

    fn slot(&self, stream: StreamKind) -> &StreamSlot {
        match stream {
            StreamKind::DataFetch => &self.data_fetch,
            StreamKind::VectorSearch => &self.vector_search,
        }
    }

    fn slot_mut(&mut self, stream: StreamKind) -> &mut StreamSlot {
        match stream {
            StreamKind::DataFetch => &mut self.data_fetch,
            StreamKind::VectorSearch => &mut self.vector_search,
        }
    }

    pub fn current(&self, stream: StreamKind) -> Option<&RequestId> {
        self.slot(stream).current.as_ref().map(|record| &record.id)
    }

    /// Issue immediately, superseding the previous request and any debounce
    /// in progress on the stream.
    pub fn issue(
        &mut self,
        stream: StreamKind,
        build: impl FnOnce(&RequestId) -> OutboundMessage,
    ) -> RequestId {
        self.slot_mut(stream).close_window();
        self.issue_now(stream, build)
    }

    /// Leading+trailing debounce: with no window open the request goes out
    /// immediately and a window opens; calls landing inside the window
    /// coalesce into a single trailing issue built from the last payload.
    pub fn debounced_issue(&mut self, stream: StreamKind, build: PayloadBuilder) {
        if self.slot(stream).debounce_task.is_some() {
            self.slot_mut(stream).trailing = Some(build);
            return;
        }
        self.issue_now(stream, build);
        self.open_window(stream);
    }

    /// Called by the dispatcher when a stream's debounce window elapses.
    /// Returns whether a coalesced trailing request was issued.
    pub fn on_debounce_elapsed(&mut self, stream: StreamKind) -> bool {
        let slot = self.slot_mut(stream);
        if let Some(task) = slot.debounce_task.take() {
            task.abort();
        }
        let Some(build) = slot.trailing.take() else {
            return false;
        };
        self.issue_now(stream, build);
        // The trailing issue starts a fresh window so another burst keeps
        // coalescing instead of issuing per call.
        self.open_window(stream);
        true
    }

    /// Logical cancellation: the message already sent cannot be unsent, but
    /// clearing the record guarantees its response will drop as stale.
    pub fn cancel(&mut self, stream: StreamKind) {
        let slot = self.slot_mut(stream);
        slot.close_window();
        slot.disarm_timeout();
        slot.current = None;
        slot.last_template = None;
    }

    /// Re-issue the stream's last payload under a fresh id (refresh pushes).
    /// Returns whether anything went out; a stream that never issued or was
    /// cancelled has nothing to re-issue.
    pub fn reissue(&mut self, stream: StreamKind) -> bool {
        let Some(template) = self.slot(stream).last_template.clone() else {
            debug!(%stream, "refresh push with nothing to re-issue");
            return false;
        };
        self.issue_now(stream, move |id| template.with_correlation_id(id.clone()));
        true
    }

    /// The current response arrived: clear the record and stop the watchdog.
    pub fn complete(&mut self, stream: StreamKind) {
        let slot = self.slot_mut(stream);
        slot.disarm_timeout();
        if let Some(record) = slot.current.take() {
            let elapsed = record.issued_at.elapsed();
            debug!(%stream, id = %record.id, ?elapsed, "request reconciled");
        }
    }

    /// Timeout fired for `(stream, id)`. Returns whether the id was still
    /// current, in which case the record is cleared so a late response for
    /// it drops as stale.
    pub fn on_timeout(&mut self, stream: StreamKind, id: &RequestId) -> bool {
        let slot = self.slot_mut(stream);
        match &slot.current {
            Some(record) if record.id == *id => {
                slot.disarm_timeout();
                slot.current = None;
                true
            }
            _ => {
                debug!(%id, "ignoring timeout for a superseded request");
                false
            }
        }
    }

    /// Push an uncorrelated message (the `ready` hello) without tracking.
    pub fn send_uncorrelated(&mut self, message: OutboundMessage) {
        self.channel.send(message);
    }

    pub fn channel_closed(&self) -> bool {
        self.channel.closed()
    }

    fn issue_now(
        &mut self,
        stream: StreamKind,
        build: impl FnOnce(&RequestId) -> OutboundMessage,
    ) -> RequestId {
        let id = RequestId::fresh(stream);
        let message = build(&id);
        let slot = self.slot_mut(stream);
        slot.disarm_timeout();
        slot.current = Some(RequestRecord {
            id: id.clone(),
            issued_at: Instant::now(),
        });
        slot.last_template = Some(message.clone());
        self.channel.send(message);
        self.arm_timeout(stream, id.clone());
        id
    }

    fn arm_timeout(&mut self, stream: StreamKind, id: RequestId) {
        let Some(timeout) = self.request_timeout else {
            return;
        };
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(SessionEvent::RequestTimedOut { stream, id });
        });
        self.slot_mut(stream).timeout_task = Some(handle);
    }

    fn open_window(&mut self, stream: StreamKind) {
        let events = self.events.clone();
        let window = self.debounce_window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = events.send(SessionEvent::DebounceElapsed(stream));
        });
        self.slot_mut(stream).debounce_task = Some(handle);
    }
}

impl Drop for RequestCoordinator {
    fn drop(&mut self) {
        self.cancel(StreamKind::DataFetch);
        self.cancel(StreamKind::VectorSearch);
    }
}
