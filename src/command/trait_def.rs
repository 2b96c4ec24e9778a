// Command trait definition and shared per-command state

use std::any::Any;

use uuid::Uuid;

use crate::event::args::NotifyEventArgs;

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Value channel of `execute` and `undo`; most commands return `None`
pub type CommandOutput = Option<Box<dyn Any + Send>>;

/// Errors that can occur during command execution
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Undo was requested with an empty undo stack
    #[error("nothing to undo")]
    NothingToUndo,

    /// Redo was requested with an empty redo stack
    #[error("nothing to redo")]
    NothingToRedo,

    /// begin_group was called while another group is still open
    #[error("a command group is already open")]
    GroupAlreadyOpen,

    /// end_group was called without an open group
    #[error("no command group is open")]
    NoOpenGroup,

    /// Command execution failed
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Undo operation failed
    #[error("undo failed: {0}")]
    UndoFailed(String),

    /// Input validation failure raised by a command implementation
    #[error(transparent)]
    Validation(#[from] CommandValidationError),
}

/// Wrapper for failures raised while validating a command's input data
///
/// Raise this from command constructors, factories or `execute` when the
/// input data is invalid. The manager never intercepts it: the error
/// propagates to the manager's caller with the cause and message of the
/// original error unchanged.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct CommandValidationError {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl CommandValidationError {
    pub fn new(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: cause.into(),
        }
    }
}

/// State every command carries: identity, description and the flags the
/// manager consults when deciding whether and how the command enters
/// history.
///
/// Deliberately not `Clone`. The id identifies one command instance, and
/// the marker check relies on it staying unique.
#[derive(Debug)]
pub struct CommandMeta {
    id: Uuid,

    /// Human-readable description of what the command does
    pub description: String,

    /// Set to cancel execution and keep the command out of history
    pub discard: bool,

    /// False marks the action as irreversible. By default, all commands
    /// can be undone.
    pub can_be_undone: bool,

    /// Explanation why the command cannot be undone; meaningful only when
    /// `can_be_undone` is false
    pub cannot_be_undone_message: String,

    /// Ask subscribers for user confirmation before executing an
    /// irreversible command
    pub requires_cannot_be_undone_confirmation: bool,
}

impl Default for CommandMeta {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            description: String::new(),
            discard: false,
            can_be_undone: true,
            cannot_be_undone_message: String::new(),
            requires_cannot_be_undone_confirmation: false,
        }
    }
}

impl CommandMeta {
    /// Meta block for an ordinary, undoable command
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Meta block for an irreversible command. `message` explains why the
    /// command cannot be undone; user confirmation is requested before
    /// execution.
    pub fn not_undoable(description: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            can_be_undone: false,
            cannot_be_undone_message: message.into(),
            requires_cannot_be_undone_confirmation: true,
            ..Self::default()
        }
    }

    /// Stable identity of this command instance
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Trait for commands that participate in the undo/redo history
///
/// Implementors embed a [`CommandMeta`] and do their work in `execute` and
/// `undo`. The two must be exact inverses: calling `undo` right after
/// `execute` restores every piece of observable state the command touched.
/// `execute` must also tolerate re-invocation, because redo runs it again
/// rather than replaying a cached result.
///
/// A command may set its discard flag before or during `execute` to signal
/// "nothing happened, do not record me". The manager checks the flag both
/// before and after invoking `execute`.
///
/// Do not call `execute` or `undo` directly on a command that should be
/// undoable. Hand it to `CommandManager::execute` so it is registered in
/// the history.
///
/// # Thread Safety
/// Commands must be Send as a manager may be moved between threads.
///
/// # Example
/// ```
/// use command_manager::{Command, CommandError, CommandMeta, CommandOutput, CommandResult};
///
/// struct SetVolumeCommand {
///     meta: CommandMeta,
///     new_volume: f32,
///     old_volume: Option<f32>,
///     mixer_volume: f32,
/// }
///
/// impl Command for SetVolumeCommand {
///     fn meta(&self) -> &CommandMeta {
///         &self.meta
///     }
///
///     fn meta_mut(&mut self) -> &mut CommandMeta {
///         &mut self.meta
///     }
///
///     fn execute(&mut self) -> CommandResult<CommandOutput> {
///         self.old_volume = Some(self.mixer_volume);
///         self.mixer_volume = self.new_volume;
///         Ok(None)
///     }
///
///     fn undo(&mut self) -> CommandResult<CommandOutput> {
///         let old = self
///             .old_volume
///             .ok_or_else(|| CommandError::UndoFailed("no old volume stored".into()))?;
///         self.mixer_volume = old;
///         Ok(None)
///     }
/// }
/// ```
pub trait Command: Send {
    /// Shared command state
    fn meta(&self) -> &CommandMeta;

    /// Mutable access to the shared command state
    fn meta_mut(&mut self) -> &mut CommandMeta;

    /// Perform the command's action
    fn execute(&mut self) -> CommandResult<CommandOutput>;

    /// Reverse the command's action
    fn undo(&mut self) -> CommandResult<CommandOutput>;

    /// Hook invoked by the manager after this command was committed,
    /// undone or redone, with the same payload delivered to manager
    /// subscribers. The default does nothing.
    fn on_executed(&mut self, _args: &NotifyEventArgs) {}

    /// Human-readable description for UI display
    fn description(&self) -> String {
        self.meta().description.clone()
    }

    fn is_discarded(&self) -> bool {
        self.meta().discard
    }

    /// Mark the command as discarded so it never enters history
    fn set_discard(&mut self, discard: bool) {
        self.meta_mut().discard = discard;
    }

    fn can_be_undone(&self) -> bool {
        self.meta().can_be_undone
    }

    /// Stable identity of this command instance, used for marker checks
    fn id(&self) -> Uuid {
        self.meta().id()
    }

    /// True only for a composite that currently holds no sub-commands.
    /// The manager refuses to record such a command.
    fn is_empty_group(&self) -> bool {
        false
    }
}
