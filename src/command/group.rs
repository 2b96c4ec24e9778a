// CommandGroup - eager composite of already-built commands

use crate::command::trait_def::{Command, CommandMeta, CommandOutput, CommandResult};

/// An ordered collection of commands that undoes and redoes as a single
/// history entry
///
/// Build a group incrementally with [`add`](CommandGroup::add), then hand
/// it to the manager like any other command. Execution runs the
/// sub-commands in insertion order; undo runs them in strict reverse
/// order. The usual way to build one is through
/// `CommandManager::begin_group`/`end_group`, which routes executed
/// commands into the open group.
pub struct CommandGroup {
    meta: CommandMeta,
    commands: Vec<Box<dyn Command>>,
}

impl CommandGroup {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            meta: CommandMeta::new(description),
            commands: Vec::new(),
        }
    }

    /// Append a command to the group
    ///
    /// A command already marked as discarded is dropped instead of stored.
    pub fn add(&mut self, command: Box<dyn Command>) {
        if !command.is_discarded() {
            self.commands.push(command);
        }
    }

    /// Number of commands currently in the group
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for CommandGroup {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut CommandMeta {
        &mut self.meta
    }

    fn execute(&mut self) -> CommandResult<CommandOutput> {
        for command in &mut self.commands {
            command.execute()?;
        }

        // Sub-commands that discarded themselves during execution must
        // not be retained for undo
        self.commands.retain(|command| !command.is_discarded());

        Ok(None)
    }

    fn undo(&mut self) -> CommandResult<CommandOutput> {
        for command in self.commands.iter_mut().rev() {
            command.undo()?;
        }

        Ok(None)
    }

    fn is_empty_group(&self) -> bool {
        self.commands.is_empty()
    }
}
