// Event payloads for the command notification surface

/// Payload delivered with `executed` and `discarded` notifications
///
/// Carries a display message and a flag telling subscribers whether the
/// command was discarded instead of committed. The message is free-form
/// diagnostic text, not something to match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyEventArgs {
    message: String,
    discarded: bool,
}

impl NotifyEventArgs {
    /// Payload for a committed command
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            discarded: false,
        }
    }

    /// Payload for a discarded command
    pub fn discarded(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            discarded: true,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }
}

/// Payload delivered with the pre-execution `executing` notification
///
/// The manager seeds `cancel` from the command's
/// `requires_cannot_be_undone_confirmation` flag. Subscribers may set it
/// to `true` to block the command, or back to `false` to let an
/// irreversible command proceed once the user has confirmed. If the flag
/// is still `true` after delivery, the command is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutingEventArgs {
    /// Whether execution should be aborted
    pub cancel: bool,
}

impl ExecutingEventArgs {
    pub fn new(cancel: bool) -> Self {
        Self { cancel }
    }
}
