// Macro - lazy composite built from command factories

use crate::command::trait_def::{Command, CommandMeta, CommandOutput, CommandResult};

/// Factory invoked at macro execution time to produce the next command
///
/// Factories must stay callable because a redo of the macro runs them
/// again. A factory error propagates out of the macro's `execute`
/// unchanged.
pub type CommandFactory = Box<dyn FnMut() -> CommandResult<Box<dyn Command>> + Send>;

/// A composite command whose sub-commands are constructed one at a time
/// while the macro executes
///
/// Unlike [`CommandGroup`](crate::command::group::CommandGroup), which
/// holds commands built up front, a macro holds factories. Each factory
/// runs only when the macro itself executes, so a later factory observes
/// the effects of every command before it. That is the point of a macro:
/// commands whose construction depends on earlier results cannot be built
/// eagerly.
///
/// A produced command that is discarded, either at construction or during
/// its execution, is skipped and never undone later. Undo drains the kept
/// commands in reverse order; a redo rebuilds them from the factories.
pub struct Macro {
    meta: CommandMeta,
    factories: Vec<CommandFactory>,
    commands: Vec<Box<dyn Command>>,
}

impl Macro {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            meta: CommandMeta::new(description),
            factories: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Append a command factory. The factory is not invoked here.
    pub fn add<F>(&mut self, factory: F)
    where
        F: FnMut() -> CommandResult<Box<dyn Command>> + Send + 'static,
    {
        self.factories.push(Box::new(factory));
    }

    /// Number of sub-commands kept by the last execution
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for Macro {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut CommandMeta {
        &mut self.meta
    }

    fn execute(&mut self) -> CommandResult<CommandOutput> {
        for factory in &mut self.factories {
            // A factory failure propagates as-is; commands already run
            // stay executed and kept
            let mut command = factory()?;

            if command.is_discarded() {
                continue;
            }

            command.execute()?;

            if !command.is_discarded() {
                self.commands.push(command);
            }
        }

        Ok(None)
    }

    fn undo(&mut self) -> CommandResult<CommandOutput> {
        while let Some(mut command) = self.commands.pop() {
            command.undo()?;
        }

        Ok(None)
    }
}
