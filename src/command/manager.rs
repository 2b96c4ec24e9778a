// CommandManager - history stacks, grouping protocol and notifications

use std::collections::VecDeque;

use uuid::Uuid;

use crate::command::group::CommandGroup;
use crate::command::trait_def::{Command, CommandError, CommandOutput, CommandResult};
use crate::event::args::{ExecutingEventArgs, NotifyEventArgs};
use crate::event::listeners::{
    ChangeHandler, ExecutingHandler, Listeners, NotifyHandler, SubscriptionId,
};

/// Default maximum number of commands to keep in history
const DEFAULT_MAX_HISTORY: usize = 100;

/// Manages command execution and undo/redo functionality
///
/// The manager maintains two stacks:
/// - Undo stack: commands that have been executed and can be undone
/// - Redo stack: commands that have been undone and can be redone
///
/// All responsibility for executing commands that should participate in
/// the history must be delegated to the manager; calling a command's
/// `execute` directly bypasses history tracking. A command lives in
/// exactly one place at a time: the undo stack, the redo stack, the open
/// group, or nowhere once discarded. Moves between stacks transfer
/// ownership, commands are never duplicated.
///
/// To build a command group (a macro recorded from live commands):
/// 1. Call [`begin_group`](CommandManager::begin_group)
/// 2. Execute each command through [`execute`](CommandManager::execute)
/// 3. Call [`end_group`](CommandManager::end_group)
///
/// The manager is single-threaded and synchronous; every operation runs to
/// completion on the calling thread. Wrap the whole manager in a mutex if
/// multiple threads need access.
///
/// # Memory Management
/// The undo stack is bounded to prevent unbounded growth. When the limit
/// is reached, the oldest command is dropped.
pub struct CommandManager {
    /// Commands that can be undone (most recent at the back)
    undo_stack: VecDeque<Box<dyn Command>>,

    /// Undone commands that can be redone (most recent at the back)
    redo_stack: VecDeque<Box<dyn Command>>,

    /// Group currently being assembled, if begin_group was called
    open_group: Option<CommandGroup>,

    /// Identity of the undo-stack top when the marker was last set
    marker: Option<Uuid>,

    /// Maximum number of commands to keep in history
    max_history: usize,

    next_subscription: SubscriptionId,
    executing_listeners: Listeners<ExecutingHandler>,
    executed_listeners: Listeners<NotifyHandler>,
    discarded_listeners: Listeners<NotifyHandler>,
    history_changed_listeners: Listeners<ChangeHandler>,
    future_changed_listeners: Listeners<ChangeHandler>,
}

impl CommandManager {
    /// Create a new CommandManager with default settings
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_MAX_HISTORY)
    }

    /// Create a new CommandManager with a custom history limit
    pub fn with_history_limit(max_history: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_history),
            redo_stack: VecDeque::with_capacity(max_history),
            open_group: None,
            marker: None,
            max_history,
            next_subscription: 0,
            executing_listeners: Listeners::new(),
            executed_listeners: Listeners::new(),
            discarded_listeners: Listeners::new(),
            history_changed_listeners: Listeners::new(),
            future_changed_listeners: Listeners::new(),
        }
    }

    /// Execute a command and register it in the history
    ///
    /// The full protocol:
    /// 1. A command already marked as discarded is reported and dropped.
    /// 2. An empty command group is a no-op.
    /// 3. Subscribers are notified via `executing` and may cancel; a
    ///    cancelled command is discarded and reported.
    /// 4. The command runs. A command that discarded itself while running
    ///    is reported and dropped; whatever it already did is its own
    ///    responsibility to clean up.
    /// 5. On commit the `executed` notification fires, then the command's
    ///    own hook, and the command goes onto the undo stack (or into the
    ///    open group).
    /// 6. The redo stack is cleared: a new execution starts a fresh
    ///    timeline.
    /// 7. A command that cannot be undone wipes the undo stack, including
    ///    itself.
    ///
    /// # Errors
    /// Returns the command's own error if execution fails. The stacks are
    /// left untouched in that case; partial effects of the failed command
    /// are not rolled back.
    pub fn execute(&mut self, mut cmd: Box<dyn Command>) -> CommandResult<CommandOutput> {
        // Discarded before it ever reached the manager
        if cmd.is_discarded() {
            let args = NotifyEventArgs::discarded("Command discarded");
            self.notify_discarded(&*cmd, &args);
            return Ok(None);
        }

        // An empty command group carries no information
        if cmd.is_empty_group() {
            return Ok(None);
        }

        // Pre-execution notification. The cancel flag starts out true for
        // commands that want user confirmation; subscribers may flip it
        // in either direction.
        let cancel = {
            let mut executing =
                ExecutingEventArgs::new(cmd.meta().requires_cannot_be_undone_confirmation);
            self.notify_executing(&*cmd, &mut executing);
            executing.cancel
        };

        if cancel {
            cmd.set_discard(true);
            let args = NotifyEventArgs::discarded("Command discarded by user");
            self.notify_discarded(&*cmd, &args);
            return Ok(None);
        }

        let result = cmd.execute()?;

        // The command may have discarded itself in its execute method
        if cmd.is_discarded() {
            let args = NotifyEventArgs::discarded("Command discarded");
            self.notify_discarded(&*cmd, &args);
            return Ok(None);
        }

        let description = cmd.description();
        log::debug!("executed: {description}");

        let args = NotifyEventArgs::new(description);
        self.notify_executed(&*cmd, &args);
        cmd.on_executed(&args);

        let can_be_undone = cmd.can_be_undone();

        // Route into the open group if begin_group was called, otherwise
        // straight onto the undo stack
        match self.open_group.as_mut() {
            Some(group) => group.add(cmd),
            None => {
                self.push_history(cmd);
                self.notify_history_changed();
            }
        }

        // A new execution starts a fresh timeline
        self.redo_stack.clear();
        self.notify_future_changed();

        // An irreversible command also invalidates everything before it
        if !can_be_undone {
            self.undo_stack.clear();
            self.notify_history_changed();
        }

        Ok(result)
    }

    /// Undo the last executed command
    ///
    /// Pops the command off the undo stack, undoes it and moves it to the
    /// redo stack. Subscribers and the command's own hook receive an
    /// `executed` notification with the description suffixed "- undone".
    ///
    /// # Errors
    /// Returns [`CommandError::NothingToUndo`] if the undo stack is empty,
    /// or the command's own error if the undo fails.
    pub fn undo(&mut self) -> CommandResult<CommandOutput> {
        let mut cmd = self
            .undo_stack
            .pop_back()
            .ok_or(CommandError::NothingToUndo)?;

        self.notify_history_changed();

        let result = cmd.undo()?;
        log::debug!("undone: {}", cmd.description());

        let args = NotifyEventArgs::new(format!("{} - undone", cmd.description()));
        self.notify_executed(&*cmd, &args);
        cmd.on_executed(&args);

        self.redo_stack.push_back(cmd);
        self.notify_future_changed();

        Ok(result)
    }

    /// Undo every command in the history, most recent first
    ///
    /// # Errors
    /// Propagates the first undo failure; earlier undos stay undone.
    pub fn undo_everything(&mut self) -> CommandResult<()> {
        while !self.undo_stack.is_empty() {
            self.undo()?;
        }
        Ok(())
    }

    /// Redo the last undone command
    ///
    /// Pops the command off the redo stack, executes it again and moves it
    /// back to the undo stack. Commands must tolerate re-invocation of
    /// `execute`; redo is a real re-execution, not a cached replay.
    /// Subscribers and the command's own hook receive an `executed`
    /// notification with the description suffixed "- redone".
    ///
    /// # Errors
    /// Returns [`CommandError::NothingToRedo`] if the redo stack is empty,
    /// or the command's own error if the re-execution fails.
    pub fn redo(&mut self) -> CommandResult<CommandOutput> {
        let mut cmd = self
            .redo_stack
            .pop_back()
            .ok_or(CommandError::NothingToRedo)?;

        self.notify_future_changed();

        let result = cmd.execute()?;
        log::debug!("redone: {}", cmd.description());

        let args = NotifyEventArgs::new(format!("{} - redone", cmd.description()));
        self.notify_executed(&*cmd, &args);
        cmd.on_executed(&args);

        self.undo_stack.push_back(cmd);
        self.notify_history_changed();

        Ok(result)
    }

    /// Open a command group
    ///
    /// Until [`end_group`](CommandManager::end_group) is called, every
    /// committed command is routed into the group instead of the undo
    /// stack, and the finished group undoes as a single entry.
    ///
    /// # Errors
    /// Returns [`CommandError::GroupAlreadyOpen`] if a group is already
    /// being assembled; groups do not nest.
    pub fn begin_group(&mut self, description: impl Into<String>) -> CommandResult<()> {
        if self.open_group.is_some() {
            return Err(CommandError::GroupAlreadyOpen);
        }

        self.open_group = Some(CommandGroup::new(description));
        Ok(())
    }

    /// Close the open command group and push it onto the undo stack
    ///
    /// # Errors
    /// Returns [`CommandError::NoOpenGroup`] if no group is open.
    pub fn end_group(&mut self) -> CommandResult<()> {
        let group = self.open_group.take().ok_or(CommandError::NoOpenGroup)?;

        self.push_history(Box::new(group));
        self.notify_history_changed();
        Ok(())
    }

    /// True while a command group is being assembled
    pub fn is_grouping(&self) -> bool {
        self.open_group.is_some()
    }

    /// Check if there are commands that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there are commands that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of commands in the undo stack
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of commands in the redo stack
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Get a description of the command that would be undone
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|cmd| cmd.description())
    }

    /// Get a description of the command that would be redone
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|cmd| cmd.description())
    }

    /// Read-only view of the undoable commands, most recent first
    pub fn undo_commands(&self) -> Vec<&dyn Command> {
        self.undo_stack.iter().rev().map(|cmd| cmd.as_ref()).collect()
    }

    /// Read-only view of the redoable commands, most recent first
    pub fn redo_commands(&self) -> Vec<&dyn Command> {
        self.redo_stack.iter().rev().map(|cmd| cmd.as_ref()).collect()
    }

    /// Remember the command currently on top of the undo stack
    ///
    /// Together with [`is_at_marker`](CommandManager::is_at_marker) this
    /// answers "has anything changed since the last save": set the marker
    /// when saving, and the document is dirty whenever the history top no
    /// longer matches it.
    pub fn set_marker(&mut self) {
        self.marker = self.undo_stack.back().map(|cmd| cmd.id());
    }

    /// Check whether the undo-stack top is the marked command
    ///
    /// With no marker set this is true only while the history is empty,
    /// i.e. nothing has ever been done.
    pub fn is_at_marker(&self) -> bool {
        match self.marker {
            None => self.undo_stack.is_empty(),
            Some(marker) => self.undo_stack.back().map(|cmd| cmd.id()) == Some(marker),
        }
    }

    /// Drop all history: both stacks, any open group and the marker
    ///
    /// A hard reset for situations like closing a document. Emits no
    /// notifications.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_group = None;
        self.marker = None;
        log::debug!("command history cleared");
    }

    /// Subscribe to the pre-execution notification
    ///
    /// The handler receives the command about to run and the mutable
    /// cancel flag.
    pub fn on_executing<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&dyn Command, &mut ExecutingEventArgs) + Send + 'static,
    {
        let id = self.next_id();
        self.executing_listeners.insert(id, Box::new(handler));
        id
    }

    /// Subscribe to the post-execution notification
    ///
    /// Fires after a commit, an undo, a redo and a discard.
    pub fn on_executed<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&dyn Command, &NotifyEventArgs) + Send + 'static,
    {
        let id = self.next_id();
        self.executed_listeners.insert(id, Box::new(handler));
        id
    }

    /// Subscribe to the discard notification
    ///
    /// Every discard delivery is followed by an `executed` delivery with
    /// the same payload.
    pub fn on_discarded<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&dyn Command, &NotifyEventArgs) + Send + 'static,
    {
        let id = self.next_id();
        self.discarded_listeners.insert(id, Box::new(handler));
        id
    }

    /// Subscribe to changes of the undo stack, e.g. to refresh an "Undo"
    /// menu item
    pub fn on_history_changed<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut() + Send + 'static,
    {
        let id = self.next_id();
        self.history_changed_listeners.insert(id, Box::new(handler));
        id
    }

    /// Subscribe to changes of the redo stack, e.g. to refresh a "Redo"
    /// menu item
    pub fn on_future_changed<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut() + Send + 'static,
    {
        let id = self.next_id();
        self.future_changed_listeners.insert(id, Box::new(handler));
        id
    }

    /// Remove a previously registered handler
    ///
    /// Returns false if the id is unknown, e.g. already unsubscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.executing_listeners.remove(id)
            || self.executed_listeners.remove(id)
            || self.discarded_listeners.remove(id)
            || self.history_changed_listeners.remove(id)
            || self.future_changed_listeners.remove(id)
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        self.next_subscription
    }

    fn push_history(&mut self, cmd: Box<dyn Command>) {
        self.undo_stack.push_back(cmd);

        // Trim history if needed
        if self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }
    }

    fn notify_executing(&mut self, command: &dyn Command, args: &mut ExecutingEventArgs) {
        for handler in self.executing_listeners.iter_mut() {
            handler(command, args);
        }
    }

    fn notify_executed(&mut self, command: &dyn Command, args: &NotifyEventArgs) {
        for handler in self.executed_listeners.iter_mut() {
            handler(command, args);
        }
    }

    // Every discard delivery is followed by an `executed` delivery with
    // the same payload
    fn notify_discarded(&mut self, command: &dyn Command, args: &NotifyEventArgs) {
        for handler in self.discarded_listeners.iter_mut() {
            handler(command, args);
        }
        for handler in self.executed_listeners.iter_mut() {
            handler(command, args);
        }
    }

    fn notify_history_changed(&mut self) {
        for handler in self.history_changed_listeners.iter_mut() {
            handler();
        }
    }

    fn notify_future_changed(&mut self) {
        for handler in self.future_changed_listeners.iter_mut() {
            handler();
        }
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}
