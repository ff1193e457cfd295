use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use lazybeads::clipboard::Clipboard;
use lazybeads::config::{CommandContext, Config, CustomCommand};
use lazybeads::tracker::{NewTask, Task, TaskPatch, TaskStatus, Tracker};
use lazybeads::tui::app::{App, Mode};
use lazybeads::tui::command::{Command, CommandResult, Executor};
use lazybeads::tui::event::AppEvent;
use lazybeads::tui::panel::PanelFocus;

/// In-memory tracker that applies mutations so reloads see them.
#[derive(Default)]
struct MemoryTracker {
    tasks: Mutex<Vec<Task>>,
    log: Mutex<Vec<String>>,
    fail_updates: bool,
}

impl MemoryTracker {
    fn with(tasks: Vec<Task>) -> Self {
        MemoryTracker {
            tasks: Mutex::new(tasks),
            ..Default::default()
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn mutations(&self) -> Vec<String> {
        self.log().into_iter().filter(|c| c != "list").collect()
    }
}

impl Tracker for MemoryTracker {
    fn list(&self) -> Result<Vec<Task>> {
        self.log.lock().unwrap().push("list".into());
        Ok(self.tasks.lock().unwrap().clone())
    }

    fn create(&self, new: &NewTask) -> Result<String> {
        self.log.lock().unwrap().push(format!("create {}", new.title));
        let mut tasks = self.tasks.lock().unwrap();
        let id = format!("bd-{}", tasks.len() + 100);
        tasks.push(Task {
            id: id.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            priority: new.priority,
            issue_type: new.issue_type.clone(),
            ..Task::default()
        });
        Ok(id)
    }

    fn update(&self, id: &str, patch: &TaskPatch) -> Result<()> {
        self.log.lock().unwrap().push(format!("update {id}"));
        if self.fail_updates {
            bail!("bd update failed: database is locked");
        }
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            bail!("no issue {id}");
        };
        if let Some(title) = &patch.title {
            task.title.clone_from(title);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(t) = &patch.issue_type {
            task.issue_type.clone_from(t);
        }
        if let Some(d) = &patch.description {
            task.description.clone_from(d);
        }
        if let Some(n) = &patch.notes {
            task.notes.clone_from(n);
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("delete {id}"));
        self.tasks.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryClipboard(Mutex<Vec<String>>);

impl Clipboard for MemoryClipboard {
    fn write_all(&self, text: &str) -> Result<()> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Drives an `App` the way the host loop does, but runs every command on
/// the test thread so results arrive deterministically.
struct Harness {
    app: App,
    executor: Executor,
    tracker: Arc<MemoryTracker>,
    clipboard: Arc<MemoryClipboard>,
}

impl Harness {
    fn new(tasks: Vec<Task>) -> Self {
        Self::with(MemoryTracker::with(tasks), &Config::default(), "true")
    }

    fn with(tracker: MemoryTracker, config: &Config, editor: &str) -> Self {
        let tracker = Arc::new(tracker);
        let clipboard = Arc::new(MemoryClipboard::default());
        let (executor, _completions) =
            Executor::new(tracker.clone(), clipboard.clone(), editor.to_string());
        let mut h = Harness {
            app: App::new(config),
            executor,
            tracker,
            clipboard,
        };
        h.send(AppEvent::Resize(120, 40));
        h.run(Command::LoadTasks);
        h
    }

    fn run(&mut self, command: Command) {
        let mut next = Some(command);
        while let Some(cmd) = next.take() {
            let result = self.executor.execute(cmd);
            next = self.app.handle_event(AppEvent::Completed(result));
        }
    }

    fn send(&mut self, event: AppEvent) {
        if let Some(cmd) = self.app.handle_event(event) {
            self.run(cmd);
        }
    }

    fn key(&mut self, code: KeyCode) {
        self.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn ctrl(&mut self, c: char) {
        self.send(AppEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::CONTROL,
        )));
    }

    fn type_str(&mut self, s: &str) {
        for c in s.chars() {
            self.key(KeyCode::Char(c));
        }
    }

    fn click(&mut self, x: u16, y: u16) {
        self.send(AppEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: x,
            row: y,
            modifiers: KeyModifiers::NONE,
        }));
    }

    fn selected_id(&self) -> Option<String> {
        self.app.selected_task().map(|t| t.id.clone())
    }
}

fn task(id: &str, status: TaskStatus, priority: u8) -> Task {
    Task {
        id: id.into(),
        title: format!("Task {id}"),
        status,
        priority,
        issue_type: "task".into(),
        ..Task::default()
    }
}

fn board() -> Vec<Task> {
    vec![
        task("bd-1", TaskStatus::Open, 2),
        task("bd-2", TaskStatus::Open, 0),
        task("bd-3", TaskStatus::InProgress, 1),
        task("bd-4", TaskStatus::Closed, 2),
        task("bd-5", TaskStatus::Blocked, 3),
    ]
}

#[test]
fn startup_partitions_and_sorts_tasks() {
    let h = Harness::new(board());
    let ids = |kind| -> Vec<String> {
        h.app
            .panels
            .get(kind)
            .items
            .iter()
            .map(|t| t.id.clone())
            .collect()
    };
    assert_eq!(ids(PanelFocus::InProgress), ["bd-3"]);
    assert_eq!(ids(PanelFocus::Open), ["bd-2", "bd-1", "bd-5"]);
    assert_eq!(ids(PanelFocus::Closed), ["bd-4"]);
    assert_eq!(h.app.panels.focused(), PanelFocus::Open);
    assert_eq!(h.selected_id().as_deref(), Some("bd-2"));
}

#[test]
fn delete_confirmed_removes_task_and_reloads() {
    let mut h = Harness::new(board());
    h.key(KeyCode::Char('d'));
    assert_eq!(h.app.mode, Mode::Confirm);
    h.key(KeyCode::Char('n'));
    assert!(h.tracker.mutations().is_empty());

    h.key(KeyCode::Char('d'));
    h.key(KeyCode::Char('y'));
    assert_eq!(h.tracker.mutations(), ["delete bd-2"]);
    assert_eq!(h.app.mode, Mode::List);
    assert_eq!(h.app.status_message.as_deref(), Some("Deleted bd-2"));
    assert!(h.app.tasks.iter().all(|t| t.id != "bd-2"));
    assert_eq!(h.tracker.log().last().map(String::as_str), Some("list"));
}

#[test]
fn editing_priority_moves_task_within_panel() {
    let mut h = Harness::new(board());
    h.key(KeyCode::Char('j'));
    assert_eq!(h.selected_id().as_deref(), Some("bd-1"));
    h.key(KeyCode::Char('p'));
    h.key(KeyCode::Char('0'));
    assert_eq!(h.tracker.mutations(), ["update bd-1"]);
    let open: Vec<_> = h.app.panels.open.items.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(open, ["bd-1", "bd-2", "bd-5"]);
    // Selection follows the task across the reload.
    assert_eq!(h.selected_id().as_deref(), Some("bd-1"));
}

#[test]
fn status_change_moves_task_to_another_panel() {
    let mut h = Harness::new(board());
    h.key(KeyCode::Char('s'));
    h.key(KeyCode::Char('i'));
    assert_eq!(h.app.panels.in_progress.len(), 2);
    assert_eq!(h.app.panels.open.len(), 2);
}

#[test]
fn create_task_through_form() {
    let mut h = Harness::new(vec![]);
    h.key(KeyCode::Char('a'));
    h.type_str("Write release notes");
    h.key(KeyCode::Tab);
    h.type_str("for 0.2");
    h.key(KeyCode::Tab);
    h.key(KeyCode::Backspace);
    h.type_str("1");
    h.ctrl('s');
    assert_eq!(h.app.mode, Mode::List);
    assert_eq!(h.tracker.mutations(), ["create Write release notes"]);
    let created = h.app.selected_task().unwrap();
    assert_eq!(created.priority, 1);
    assert_eq!(created.description, "for 0.2");
}

#[test]
fn failed_update_reports_error_and_returns_to_list() {
    let tracker = MemoryTracker {
        fail_updates: true,
        ..MemoryTracker::with(board())
    };
    let mut h = Harness::with(tracker, &Config::default(), "true");
    h.key(KeyCode::Char('e'));
    h.type_str("!");
    h.key(KeyCode::Enter);
    assert_eq!(h.app.mode, Mode::List);
    assert!(h.app.modal.is_none());
    assert_eq!(
        h.app.last_error.as_deref(),
        Some("bd update failed: database is locked")
    );

    // The next successful action clears it.
    h.key(KeyCode::Char('r'));
    assert!(h.app.last_error.is_none());
}

#[test]
fn copy_id_writes_clipboard() {
    let mut h = Harness::new(board());
    h.key(KeyCode::Char('y'));
    assert_eq!(*h.clipboard.0.lock().unwrap(), ["bd-2"]);
    assert_eq!(h.app.status_message.as_deref(), Some("Copied bd-2"));
}

#[test]
fn search_then_clear_filter() {
    let mut h = Harness::new(board());
    h.key(KeyCode::Char('/'));
    h.type_str("bd-1");
    h.key(KeyCode::Enter);
    assert_eq!(h.app.panels.open.len(), 1);
    assert!(h.app.panels.in_progress.is_empty());
    assert!(h.app.panels.visible().iter().all(|&p| p != PanelFocus::InProgress));

    h.key(KeyCode::Char('F'));
    assert_eq!(h.app.filter_query, "");
    assert_eq!(h.app.panels.open.len(), 3);
}

#[test]
fn mouse_selects_row_and_opens_detail() {
    let mut h = Harness::new(board());
    let open = h
        .app
        .panels
        .bounds(120)
        .into_iter()
        .find(|(k, _)| *k == PanelFocus::Open)
        .map(|(_, b)| b)
        .unwrap();
    h.click(3, (open.top + 3) as u16);
    assert_eq!(h.selected_id().as_deref(), Some("bd-5"));

    h.click(100, 10);
    assert_eq!(h.app.mode, Mode::Detail);
    h.key(KeyCode::Esc);
    assert_eq!(h.app.mode, Mode::List);
}

#[test]
fn select_modal_mouse_dismiss_and_apply() {
    let mut h = Harness::new(board());
    h.key(KeyCode::Char('t'));
    assert_eq!(h.app.mode, Mode::EditType);
    h.click(0, 0);
    assert_eq!(h.app.mode, Mode::List);
    assert!(h.tracker.mutations().is_empty());

    h.key(KeyCode::Char('t'));
    let b = h.app.modal.as_ref().unwrap().bounds(120, 40);
    // Second option row is "Bug".
    h.click((b.left + 2) as u16, (b.top + 3) as u16);
    assert_eq!(h.tracker.mutations(), ["update bd-2"]);
    let bd2 = h.app.tasks.iter().find(|t| t.id == "bd-2").unwrap();
    assert_eq!(bd2.issue_type, "bug");
}

#[test]
fn custom_command_with_bad_template_reports_error() {
    let mut config = Config::default();
    config.custom_commands.push(CustomCommand {
        key: "o".into(),
        description: "Open".into(),
        context: CommandContext::List,
        command: "open {{.Nope}}".into(),
    });
    let mut h = Harness::with(MemoryTracker::with(board()), &config, "true");
    h.key(KeyCode::Char('o'));
    assert!(
        h.app
            .last_error
            .as_deref()
            .unwrap()
            .starts_with("template error:")
    );
    assert_eq!(h.app.mode, Mode::List);
}

#[test]
fn custom_command_launches_without_waiting() {
    let mut config = Config::default();
    config.custom_commands.push(CustomCommand {
        key: "x".into(),
        description: "Noop".into(),
        context: CommandContext::Global,
        command: "true {{sh .Title}}".into(),
    });
    let mut h = Harness::with(MemoryTracker::with(board()), &config, "true");
    h.key(KeyCode::Char('x'));
    assert!(h.app.last_error.is_none());
    assert!(h.tracker.mutations().is_empty());
}

#[cfg(unix)]
#[test]
fn editor_session_updates_description() {
    let editor = r#"sh -c 'printf "rewritten\n" > "$1"' editor"#;
    let mut h = Harness::with(MemoryTracker::with(board()), &Config::default(), editor);
    h.key(KeyCode::Char('E'));
    assert_eq!(h.tracker.mutations(), ["update bd-2"]);
    let bd2 = h.app.tasks.iter().find(|t| t.id == "bd-2").unwrap();
    assert_eq!(bd2.description, "rewritten");
}

#[cfg(unix)]
#[test]
fn editor_without_changes_issues_no_update() {
    let mut h = Harness::new(board());
    h.key(KeyCode::Char('E'));
    assert!(h.tracker.mutations().is_empty());
    assert_eq!(h.app.status_message.as_deref(), Some("Description unchanged"));
}

#[test]
fn completion_results_surface_errors() {
    let mut h = Harness::new(board());
    h.send(AppEvent::Completed(CommandResult::ShellLaunched(Err(
        "failed to execute command: boom".into(),
    ))));
    assert_eq!(
        h.app.last_error.as_deref(),
        Some("failed to execute command: boom")
    );
}
