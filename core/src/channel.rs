use periscope_protocol::OutboundMessage;
use thiserror::Error;
use tracing::warn;

/// The host reported the panel channel gone (panel disposed, process exit).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("panel channel is closed")]
pub struct ChannelClosed;

/// The one capability the core needs from its host: push a message toward
/// the backend. Fire-and-forget; delivery and ordering are not guaranteed
/// even when the call succeeds.
pub trait ChannelSender {
    fn send(&self, message: OutboundMessage) -> Result<(), ChannelClosed>;
}

/// Send-or-degrade wrapper around the host sender. A failed send never
/// reaches request logic as an error: it downgrades to a no-op and flips a
/// sticky `closed` flag the session surfaces to the presentation layer.
pub struct PanelChannel {
    sender: Box<dyn ChannelSender + Send>,
    closed: bool,
}

impl PanelChannel {
    pub fn new(sender: Box<dyn ChannelSender + Send>) -> Self {
        Self {
            sender,
            closed: false,
        }
    }

    pub fn send(&mut self, message: OutboundMessage) {
        if self.sender.send(message).is_err() && !self.closed {
            warn!("panel channel closed; dropping outbound messages from now on");
            self.closed = true;
        }
    }

    pub fn closed(&self) -> bool {
        self.closed
    }
}
