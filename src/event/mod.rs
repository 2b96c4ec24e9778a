// Notification surface for the command engine
//
// Payload types plus the subscription registry used by the CommandManager.
// Delivery is synchronous and ordered by subscription order; there is no
// threading involved.

pub mod args;
pub mod listeners;

pub use args::{ExecutingEventArgs, NotifyEventArgs};
pub use listeners::SubscriptionId;
