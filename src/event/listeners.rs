// Subscription registry backing the manager's notifications

use crate::command::trait_def::Command;
use crate::event::args::{ExecutingEventArgs, NotifyEventArgs};

/// Handle returned when subscribing to a manager notification
///
/// Ids are unique across all notification kinds of one manager, so a
/// single `unsubscribe` call can find the handler wherever it lives.
pub type SubscriptionId = u64;

/// Handler for the pre-execution `executing` notification
pub(crate) type ExecutingHandler = Box<dyn FnMut(&dyn Command, &mut ExecutingEventArgs) + Send>;

/// Handler for the `executed` and `discarded` notifications
pub(crate) type NotifyHandler = Box<dyn FnMut(&dyn Command, &NotifyEventArgs) + Send>;

/// Handler for the `history_changed` and `future_changed` notifications
pub(crate) type ChangeHandler = Box<dyn FnMut() + Send>;

/// Ordered list of handlers for one notification kind
///
/// Delivery walks the list in subscription order. Removal is by id and
/// leaves the order of the remaining handlers untouched.
pub(crate) struct Listeners<H> {
    entries: Vec<(SubscriptionId, H)>,
}

impl<H> Listeners<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: SubscriptionId, handler: H) {
        self.entries.push((id, handler));
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut H> {
        self.entries.iter_mut().map(|(_, handler)| handler)
    }
}
