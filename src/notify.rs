use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::model::{Notification, User, UserId};

/// Per-user inboxes. The coordinator is the only writer; each user owns the
/// receive half. One unbounded channel per user, so delivery follows
/// emission order.
pub struct NotifyHub {
    inboxes: DashMap<UserId, mpsc::UnboundedSender<Notification>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            inboxes: DashMap::new(),
        }
    }

    /// Open an inbox for `user`. Registering again replaces the previous inbox.
    pub fn register(&self, user: &User) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inboxes.insert(user.id, tx);
        rx
    }

    /// Deliver to the booking owner's inbox. No-op if nobody is listening.
    pub fn send(&self, notification: Notification) {
        let user = notification.booking.owner.id;
        let Some(inbox) = self.inboxes.get(&user) else {
            debug!(user, "no inbox registered, dropping notification");
            return;
        };
        if inbox.send(notification).is_err() {
            debug!(user, "inbox closed, dropping notification");
        }
    }

    pub fn is_registered(&self, user: UserId) -> bool {
        self.inboxes.contains_key(&user)
    }

    pub fn remove(&self, user: UserId) {
        self.inboxes.remove(&user);
    }
}
