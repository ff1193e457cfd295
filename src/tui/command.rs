use std::sync::{Arc, mpsc};
use std::thread;

use anyhow::Result;

use crate::clipboard::Clipboard;
use crate::tracker::{NewTask, Task, TaskPatch, Tracker};

use super::custom_command;
use super::editor;

/// A side effect requested by an event handler. Handlers build these as plain
/// data; nothing runs until the host loop hands them to an [`Executor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadTasks,
    Create(NewTask),
    Update { id: String, patch: TaskPatch },
    Delete { id: String },
    CopyToClipboard { text: String },
    ShellExec { command: String },
    /// Edit a task's description in the external editor.
    EditInEditor { id: String, initial: String },
}

impl Command {
    /// The editor needs the real terminal; everything else runs behind the UI.
    pub fn suspends_terminal(&self) -> bool {
        matches!(self, Command::EditInEditor { .. })
    }
}

/// Outcome of a [`Command`], fed back into the event stream. Errors are
/// pre-rendered for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    TasksLoaded(Result<Vec<Task>, String>),
    TaskCreated(Result<String, String>),
    TaskUpdated { id: String, result: Result<(), String> },
    TaskDeleted { id: String, result: Result<(), String> },
    ClipboardWritten { text: String, result: Result<(), String> },
    ShellLaunched(Result<(), String>),
    EditorFinished { id: String, initial: String, result: Result<String, String> },
}

fn flatten<T>(result: Result<T>) -> Result<T, String> {
    result.map_err(|e| format!("{e:#}"))
}

/// Runs commands against the collaborators and reports completions on a channel.
#[derive(Clone)]
pub struct Executor {
    tracker: Arc<dyn Tracker>,
    clipboard: Arc<dyn Clipboard>,
    editor: String,
    tx: mpsc::Sender<CommandResult>,
}

impl Executor {
    pub fn new(
        tracker: Arc<dyn Tracker>,
        clipboard: Arc<dyn Clipboard>,
        editor: String,
    ) -> (Self, mpsc::Receiver<CommandResult>) {
        let (tx, rx) = mpsc::channel();
        (
            Executor {
                tracker,
                clipboard,
                editor,
                tx,
            },
            rx,
        )
    }

    /// Run `command` to completion on the calling thread.
    pub fn execute(&self, command: Command) -> CommandResult {
        tracing::debug!(?command, "executing command");
        let result = match command {
            Command::LoadTasks => CommandResult::TasksLoaded(flatten(self.tracker.list())),
            Command::Create(task) => CommandResult::TaskCreated(flatten(self.tracker.create(&task))),
            Command::Update { id, patch } => {
                let result = flatten(self.tracker.update(&id, &patch));
                CommandResult::TaskUpdated { id, result }
            }
            Command::Delete { id } => {
                let result = flatten(self.tracker.delete(&id));
                CommandResult::TaskDeleted { id, result }
            }
            Command::CopyToClipboard { text } => {
                let result = flatten(self.clipboard.write_all(&text));
                CommandResult::ClipboardWritten { text, result }
            }
            Command::ShellExec { command } => {
                CommandResult::ShellLaunched(flatten(custom_command::launch(&command)))
            }
            Command::EditInEditor { id, initial } => {
                let result = flatten(editor::edit_text(&self.editor, &initial));
                CommandResult::EditorFinished { id, initial, result }
            }
        };
        if let Some(err) = result.error() {
            tracing::warn!(error = %err, "command failed");
        }
        result
    }

    /// Run `command` on a worker thread; its result arrives on the receiver
    /// returned by [`Executor::new`].
    pub fn dispatch(&self, command: Command) {
        let executor = self.clone();
        thread::spawn(move || {
            let result = executor.execute(command);
            // The receiver is gone only when the app is shutting down.
            let _ = executor.tx.send(result);
        });
    }

    /// Report a result produced on the calling thread (the editor session).
    pub fn complete(&self, result: CommandResult) {
        let _ = self.tx.send(result);
    }
}

impl CommandResult {
    pub fn error(&self) -> Option<&str> {
        let err = match self {
            CommandResult::TasksLoaded(r) => r.as_ref().err(),
            CommandResult::TaskCreated(r) => r.as_ref().err(),
            CommandResult::TaskUpdated { result, .. }
            | CommandResult::TaskDeleted { result, .. }
            | CommandResult::ClipboardWritten { result, .. }
            | CommandResult::ShellLaunched(result) => result.as_ref().err(),
            CommandResult::EditorFinished { result, .. } => result.as_ref().err(),
        };
        err.map(String::as_str)
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::testing::{RecordingClipboard, RecordingTracker};
    use super::*;

    fn executor(tracker: Arc<RecordingTracker>) -> (Executor, mpsc::Receiver<CommandResult>) {
        Executor::new(tracker, Arc::new(RecordingClipboard::default()), "true".into())
    }

    #[test]
    fn only_editor_suspends_terminal() {
        assert!(
            Command::EditInEditor {
                id: "bd-1".into(),
                initial: String::new()
            }
            .suspends_terminal()
        );
        assert!(!Command::LoadTasks.suspends_terminal());
        assert!(
            !Command::ShellExec {
                command: "true".into()
            }
            .suspends_terminal()
        );
    }

    #[test]
    fn delete_calls_tracker_once() {
        let tracker = Arc::new(RecordingTracker::default());
        let (exec, _rx) = executor(tracker.clone());
        let result = exec.execute(Command::Delete { id: "bd-42".into() });
        assert_eq!(
            result,
            CommandResult::TaskDeleted {
                id: "bd-42".into(),
                result: Ok(())
            }
        );
        assert_eq!(tracker.calls(), ["delete bd-42"]);
    }

    #[test]
    fn tracker_failure_becomes_error_text() {
        let tracker = Arc::new(RecordingTracker {
            fail: true,
            ..RecordingTracker::default()
        });
        let (exec, _rx) = executor(tracker);
        let result = exec.execute(Command::LoadTasks);
        assert_eq!(result.error(), Some("tracker unavailable"));
    }

    #[test]
    fn dispatch_delivers_result_on_channel() {
        let tracker = Arc::new(RecordingTracker::default());
        let (exec, rx) = executor(tracker);
        exec.dispatch(Command::CopyToClipboard {
            text: "bd-7".into(),
        });
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            result,
            CommandResult::ClipboardWritten {
                text: "bd-7".into(),
                result: Ok(())
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn editor_session_returns_text() {
        let tracker = Arc::new(RecordingTracker::default());
        let (exec, _rx) = executor(tracker);
        let result = exec.execute(Command::EditInEditor {
            id: "bd-1".into(),
            initial: "notes".into(),
        });
        assert_eq!(
            result,
            CommandResult::EditorFinished {
                id: "bd-1".into(),
                initial: "notes".into(),
                result: Ok("notes".into())
            }
        );
    }
}
