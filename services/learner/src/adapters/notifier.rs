//! services/learner/src/adapters/notifier.rs
//!
//! Implements the `Notifier` port over a tokio channel so the host can drain
//! notifications on its own schedule.

use learning_core::domain::Notification;
use learning_core::ports::Notifier;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            debug!("Notification dropped; the receiver has gone away.");
        }
    }
}
