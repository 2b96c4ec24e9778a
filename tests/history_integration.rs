//! Integration tests for the undo/redo engine
//!
//! Drives the public API end to end: execute/undo/redo round trips,
//! command groups, lazy macros, the clean/dirty marker and the
//! notification surface.

use command_manager::{
    Command, CommandError, CommandGroup, CommandManager, CommandMeta, CommandOutput, CommandResult,
    CommandValidationError, Macro,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Appends text to a shared document; undo removes exactly what was added
struct AppendTextCommand {
    meta: CommandMeta,
    doc: Arc<Mutex<String>>,
    text: String,
}

impl AppendTextCommand {
    fn new(doc: Arc<Mutex<String>>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            meta: CommandMeta::new(format!("Append \"{text}\"")),
            doc,
            text,
        }
    }

    fn boxed(doc: Arc<Mutex<String>>, text: impl Into<String>) -> Box<dyn Command> {
        Box::new(Self::new(doc, text))
    }
}

impl Command for AppendTextCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut CommandMeta {
        &mut self.meta
    }

    fn execute(&mut self) -> CommandResult<CommandOutput> {
        self.doc.lock().unwrap().push_str(&self.text);
        Ok(None)
    }

    fn undo(&mut self) -> CommandResult<CommandOutput> {
        let mut doc = self.doc.lock().unwrap();
        let new_len = doc
            .len()
            .checked_sub(self.text.len())
            .ok_or_else(|| CommandError::UndoFailed("document shorter than appended text".into()))?;
        doc.truncate(new_len);
        Ok(None)
    }
}

/// Counts execute/undo invocations through shared counters
struct CountingCommand {
    meta: CommandMeta,
    executed: Arc<AtomicUsize>,
    undone: Arc<AtomicUsize>,
}

impl CountingCommand {
    fn new(executed: Arc<AtomicUsize>, undone: Arc<AtomicUsize>) -> Self {
        Self {
            meta: CommandMeta::new("Count"),
            executed,
            undone,
        }
    }
}

impl Command for CountingCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut CommandMeta {
        &mut self.meta
    }

    fn execute(&mut self) -> CommandResult<CommandOutput> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    fn undo(&mut self) -> CommandResult<CommandOutput> {
        self.undone.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[test]
fn test_execute_undo_redo_roundtrip() {
    init_logging();
    let mut manager = CommandManager::new();
    let doc = Arc::new(Mutex::new(String::new()));

    manager
        .execute(AppendTextCommand::boxed(doc.clone(), "Hello"))
        .unwrap();
    assert_eq!(*doc.lock().unwrap(), "Hello");

    manager.undo().unwrap();
    assert_eq!(*doc.lock().unwrap(), "");
    assert_eq!(manager.undo_count(), 0);
    assert_eq!(manager.redo_count(), 1);

    manager.redo().unwrap();
    assert_eq!(*doc.lock().unwrap(), "Hello");
    assert_eq!(manager.undo_count(), 1);
    assert_eq!(manager.redo_count(), 0);
}

#[test]
fn test_two_command_history_scenario() {
    let mut manager = CommandManager::new();
    let doc = Arc::new(Mutex::new(String::new()));

    manager
        .execute(AppendTextCommand::boxed(doc.clone(), "a"))
        .unwrap();
    let undo = manager.undo_commands();
    assert_eq!(undo.len(), 1);
    assert_eq!(undo[0].description(), "Append \"a\"");

    manager
        .execute(AppendTextCommand::boxed(doc.clone(), "b"))
        .unwrap();
    let undo = manager.undo_commands();
    assert_eq!(undo.len(), 2);
    // Most recent first
    assert_eq!(undo[0].description(), "Append \"b\"");
    assert_eq!(undo[1].description(), "Append \"a\"");

    manager.undo().unwrap();
    assert_eq!(manager.undo_count(), 1);
    assert_eq!(manager.redo_count(), 1);
    assert_eq!(*doc.lock().unwrap(), "a");

    manager.redo().unwrap();
    assert_eq!(manager.undo_count(), 2);
    assert_eq!(manager.redo_count(), 0);
    assert_eq!(*doc.lock().unwrap(), "ab");
}

#[test]
fn test_new_execution_clears_redo_history() {
    let mut manager = CommandManager::new();
    let doc = Arc::new(Mutex::new(String::new()));

    for text in ["a", "b", "c"] {
        manager
            .execute(AppendTextCommand::boxed(doc.clone(), text))
            .unwrap();
    }
    manager.undo().unwrap();
    manager.undo().unwrap();
    assert_eq!(manager.redo_count(), 2);

    manager
        .execute(AppendTextCommand::boxed(doc.clone(), "x"))
        .unwrap();

    assert_eq!(manager.redo_count(), 0);
    assert_eq!(*doc.lock().unwrap(), "ax");
}

#[test]
fn test_redo_re_executes_instead_of_replaying() {
    let mut manager = CommandManager::new();
    let executed = Arc::new(AtomicUsize::new(0));
    let undone = Arc::new(AtomicUsize::new(0));

    manager
        .execute(Box::new(CountingCommand::new(
            executed.clone(),
            undone.clone(),
        )))
        .unwrap();
    manager.undo().unwrap();
    manager.redo().unwrap();

    assert_eq!(executed.load(Ordering::SeqCst), 2);
    assert_eq!(undone.load(Ordering::SeqCst), 1);
}

#[test]
fn test_group_undoes_as_single_entry_in_reverse_order() {
    init_logging();
    let mut manager = CommandManager::new();
    let journal = Arc::new(Mutex::new(Vec::new()));

    struct JournalCommand {
        meta: CommandMeta,
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Command for JournalCommand {
        fn meta(&self) -> &CommandMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut CommandMeta {
            &mut self.meta
        }

        fn execute(&mut self) -> CommandResult<CommandOutput> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("execute {}", self.name));
            Ok(None)
        }

        fn undo(&mut self) -> CommandResult<CommandOutput> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("undo {}", self.name));
            Ok(None)
        }
    }

    manager.begin_group("Rename track").unwrap();
    for name in ["a", "b", "c"] {
        manager
            .execute(Box::new(JournalCommand {
                meta: CommandMeta::new(name),
                name,
                journal: journal.clone(),
            }))
            .unwrap();
    }
    manager.end_group().unwrap();

    assert_eq!(manager.undo_count(), 1);

    manager.undo().unwrap();

    let entries = journal.lock().unwrap();
    assert_eq!(
        *entries,
        vec![
            "execute a",
            "execute b",
            "execute c",
            "undo c",
            "undo b",
            "undo a",
        ]
    );
}

#[test]
fn test_macro_factories_see_earlier_effects() {
    let mut manager = CommandManager::new();
    let doc = Arc::new(Mutex::new(String::new()));

    let mut macro_command = Macro::new("Insert greeting");
    {
        let doc = doc.clone();
        macro_command.add(move || Ok(AppendTextCommand::boxed(doc.clone(), "Hello")));
    }
    {
        let doc = doc.clone();
        macro_command.add(move || {
            // Runs after the first command, so it can react to its effect
            let suffix = if doc.lock().unwrap().as_str() == "Hello" {
                ", world"
            } else {
                "!"
            };
            Ok(AppendTextCommand::boxed(doc.clone(), suffix))
        });
    }

    manager.execute(Box::new(macro_command)).unwrap();
    assert_eq!(*doc.lock().unwrap(), "Hello, world");
    assert_eq!(manager.undo_count(), 1);

    manager.undo().unwrap();
    assert_eq!(*doc.lock().unwrap(), "");

    manager.redo().unwrap();
    assert_eq!(*doc.lock().unwrap(), "Hello, world");
}

#[test]
fn test_macro_skips_self_discarding_command() {
    let mut manager = CommandManager::new();
    let executed = Arc::new(AtomicUsize::new(0));
    let undone = Arc::new(AtomicUsize::new(0));

    let mut macro_command = Macro::new("Conditional edit");
    {
        let executed = executed.clone();
        let undone = undone.clone();
        // Discards itself at construction time
        macro_command.add(move || {
            let mut command = CountingCommand::new(executed.clone(), undone.clone());
            command.meta_mut().discard = true;
            Ok(Box::new(command) as Box<dyn Command>)
        });
    }
    {
        let executed = executed.clone();
        let undone = undone.clone();
        macro_command.add(move || {
            Ok(Box::new(CountingCommand::new(executed.clone(), undone.clone()))
                as Box<dyn Command>)
        });
    }

    manager.execute(Box::new(macro_command)).unwrap();
    assert_eq!(executed.load(Ordering::SeqCst), 1);

    manager.undo().unwrap();
    assert_eq!(undone.load(Ordering::SeqCst), 1);

    manager.redo().unwrap();
    assert_eq!(executed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_macro_factory_validation_error_propagates() {
    let mut manager = CommandManager::new();
    let doc = Arc::new(Mutex::new(String::new()));

    let mut macro_command = Macro::new("Partially valid edit");
    {
        let doc = doc.clone();
        macro_command.add(move || Ok(AppendTextCommand::boxed(doc.clone(), "kept")));
    }
    macro_command.add(|| Err(CommandValidationError::new("empty insert text").into()));

    let error = manager.execute(Box::new(macro_command)).unwrap_err();

    assert!(matches!(error, CommandError::Validation(_)));
    assert_eq!(error.to_string(), "empty insert text");
    // The first command executed before the failure; nothing was rolled
    // back, and the failed macro never reached the history
    assert_eq!(*doc.lock().unwrap(), "kept");
    assert_eq!(manager.undo_count(), 0);
}

#[test]
fn test_marker_detects_unsaved_changes() {
    let mut manager = CommandManager::new();
    let doc = Arc::new(Mutex::new(String::new()));

    assert!(manager.is_at_marker());

    manager
        .execute(AppendTextCommand::boxed(doc.clone(), "a"))
        .unwrap();
    manager.set_marker();
    assert!(manager.is_at_marker());

    manager
        .execute(AppendTextCommand::boxed(doc.clone(), "b"))
        .unwrap();
    assert!(!manager.is_at_marker());

    manager.undo().unwrap();
    assert!(manager.is_at_marker());
}

#[test]
fn test_discard_notifications_fire_in_pairs() {
    let mut manager = CommandManager::new();
    let doc = Arc::new(Mutex::new(String::new()));
    let events = Arc::new(Mutex::new(Vec::new()));

    {
        let events = events.clone();
        manager.on_discarded(move |_, args| {
            events
                .lock()
                .unwrap()
                .push(format!("discarded: {}", args.message()));
        });
    }
    {
        let events = events.clone();
        manager.on_executed(move |_, args| {
            events.lock().unwrap().push(format!(
                "executed: {} (discarded={})",
                args.message(),
                args.is_discarded()
            ));
        });
    }

    let mut command = AppendTextCommand::new(doc.clone(), "never");
    command.meta_mut().discard = true;
    manager.execute(Box::new(command)).unwrap();

    assert_eq!(*doc.lock().unwrap(), "");
    assert_eq!(manager.undo_count(), 0);

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            "discarded: Command discarded",
            "executed: Command discarded (discarded=true)",
        ]
    );
}

#[test]
fn test_undo_everything_rewinds_document() {
    let mut manager = CommandManager::new();
    let doc = Arc::new(Mutex::new(String::new()));

    for text in ["a", "b", "c", "d"] {
        manager
            .execute(AppendTextCommand::boxed(doc.clone(), text))
            .unwrap();
    }
    assert_eq!(*doc.lock().unwrap(), "abcd");

    manager.undo_everything().unwrap();

    assert_eq!(*doc.lock().unwrap(), "");
    assert_eq!(manager.undo_count(), 0);
    assert_eq!(manager.redo_count(), 4);
}

#[test]
fn test_command_hook_observes_own_commitment() {
    let mut manager = CommandManager::new();
    let hook_messages = Arc::new(Mutex::new(Vec::new()));

    struct HookedCommand {
        meta: CommandMeta,
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl Command for HookedCommand {
        fn meta(&self) -> &CommandMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut CommandMeta {
            &mut self.meta
        }

        fn execute(&mut self) -> CommandResult<CommandOutput> {
            Ok(None)
        }

        fn undo(&mut self) -> CommandResult<CommandOutput> {
            Ok(None)
        }

        fn on_executed(&mut self, args: &command_manager::NotifyEventArgs) {
            self.messages.lock().unwrap().push(args.message().to_string());
        }
    }

    manager
        .execute(Box::new(HookedCommand {
            meta: CommandMeta::new("Toggle mute"),
            messages: hook_messages.clone(),
        }))
        .unwrap();
    manager.undo().unwrap();
    manager.redo().unwrap();

    let messages = hook_messages.lock().unwrap();
    assert_eq!(
        *messages,
        vec![
            "Toggle mute",
            "Toggle mute - undone",
            "Toggle mute - redone",
        ]
    );
}

#[test]
fn test_empty_group_execution_leaves_no_trace() {
    let mut manager = CommandManager::new();

    let result = manager.execute(Box::new(CommandGroup::new("Nothing"))).unwrap();

    assert!(result.is_none());
    assert_eq!(manager.undo_count(), 0);
    assert!(manager.is_at_marker());
}
