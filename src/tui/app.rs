use std::io::stdout;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use ratatui::text::Line;

use crate::config::{CommandContext, Config, CustomCommand};
use crate::tracker::{Task, TaskPatch, TaskStatus};

use super::command::{Command, CommandResult, Executor};
use super::custom_command;
use super::event::{self, AppEvent};
use super::form::{TaskForm, TextInput};
use super::hit_test::{self, ModalHit, WHEEL_STEP};
use super::keymap::{Action, KeyMap, key_string};
use super::markdown::MarkdownRenderer;
use super::modal::{self, Modal};
use super::panel::{PanelFocus, Panels, Viewport};
use super::theme::Theme;
use super::ui;

/// Top-level interaction mode. Exactly one is active; the inline search
/// overlay (`App::search`) sits on top of `List`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List,
    Detail,
    Form,
    Help,
    Confirm,
    Filter,
    EditTitle,
    EditStatus,
    EditPriority,
    EditType,
    EditNotes,
}

/// A destructive command waiting for y/n. The command is built when the
/// user asks, so it names the task that was selected at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirm {
    pub message: String,
    pub action: Command,
}

pub struct App {
    pub mode: Mode,
    /// Inline search input in the status bar, when open.
    pub search: Option<TextInput>,
    pub panels: Panels,
    pub tasks: Vec<Task>,
    pub filter_query: String,
    pub modal: Option<Modal>,
    pub form: TaskForm,
    pub confirm: Option<PendingConfirm>,

    pub detail: Viewport,
    pub detail_lines: Vec<Line<'static>>,
    pub help: Viewport,

    pub keymap: KeyMap,
    pub custom_commands: Vec<CustomCommand>,
    pub theme: Theme,
    pub markdown: MarkdownRenderer,

    pub width: u16,
    pub height: u16,

    /// Latest recoverable failure, shown until the next successful action.
    pub last_error: Option<String>,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let theme = config.theme.build();
        let markdown = MarkdownRenderer::new(&theme);
        let mut app = App {
            mode: Mode::List,
            search: None,
            panels: Panels::new(),
            tasks: vec![],
            filter_query: String::new(),
            modal: None,
            form: TaskForm::new(),
            confirm: None,
            detail: Viewport::default(),
            detail_lines: vec![],
            help: Viewport::default(),
            keymap: KeyMap::default_keymap(),
            custom_commands: config.custom_commands.clone(),
            theme,
            markdown,
            width: 0,
            height: 0,
            last_error: None,
            status_message: None,
            should_quit: false,
        };
        app.resize(80, 24);
        app
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.panels.selected_task()
    }

    /// Main loop. Deferred commands run on the executor's worker threads,
    /// except the editor session which takes over the terminal.
    pub fn run(
        &mut self,
        terminal: &mut DefaultTerminal,
        executor: &Executor,
        completions: &mpsc::Receiver<CommandResult>,
    ) -> Result<()> {
        let tick_rate = Duration::from_millis(250);
        let size = terminal.size()?;
        self.resize(size.width, size.height);
        executor.dispatch(Command::LoadTasks);

        loop {
            terminal.draw(|frame| ui::draw(frame, self))?;

            let event = event::poll(tick_rate, completions)?;
            if let Some(command) = self.handle_event(event) {
                if command.suspends_terminal() {
                    let result = suspended(terminal, || executor.execute(command))?;
                    executor.complete(result);
                } else {
                    executor.dispatch(command);
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    /// Advance the state machine by one event. Returns the side effect the
    /// host loop should run, if any.
    pub fn handle_event(&mut self, event: AppEvent) -> Option<Command> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Mouse(mouse) => self.handle_mouse(mouse),
            AppEvent::Resize(w, h) => {
                self.resize(w, h);
                None
            }
            AppEvent::Completed(result) => self.handle_result(result),
            AppEvent::Tick => None,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        // Last row is the status bar.
        self.panels.layout(height.saturating_sub(1));
        let view_height = usize::from(height.saturating_sub(3));
        self.detail.set_height(view_height);
        self.help.set_height(view_height);
        let help_len = ui::wrapped_len(&ui::help_lines(self), width.saturating_sub(2));
        self.help.set_content_len(help_len);
        if self.mode == Mode::Detail {
            self.refresh_detail();
        }
    }

    // ── Keys ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }
        self.status_message = None;

        if self.mode == Mode::List && self.search.is_some() {
            self.handle_search_key(key);
            return None;
        }

        match self.mode {
            Mode::List => self.handle_list_key(key),
            Mode::Detail => self.handle_detail_key(key),
            Mode::Form => self.handle_form_key(key),
            Mode::Help => {
                self.handle_help_key(key);
                None
            }
            Mode::Confirm => self.handle_confirm_key(key),
            Mode::Filter => {
                self.handle_filter_key(key);
                None
            }
            Mode::EditTitle => self.handle_title_key(key),
            Mode::EditStatus | Mode::EditPriority | Mode::EditType => self.handle_select_key(key),
            Mode::EditNotes => self.handle_notes_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Option<Command> {
        let Some(action) = self.keymap.lookup(key.code, key.modifiers) else {
            return self.run_custom_command(&key, CommandContext::List);
        };

        match action {
            Action::Quit => self.should_quit = true,
            Action::MoveUp => self.panels.scroll(-1),
            Action::MoveDown => self.panels.scroll(1),
            Action::PageUp => self.panels.focused_panel_mut().page(false),
            Action::PageDown => self.panels.focused_panel_mut().page(true),
            Action::Top => self.panels.focused_panel_mut().go_top(),
            Action::Bottom => self.panels.focused_panel_mut().go_bottom(),
            Action::NextPanel => self.panels.cycle_focus(1),
            Action::PrevPanel => self.panels.cycle_focus(-1),
            Action::Select => self.open_detail(),
            Action::Add => {
                self.form = TaskForm::new();
                self.last_error = None;
                self.mode = Mode::Form;
            }
            Action::Delete => {
                let id = self.selected_task()?.id.clone();
                self.confirm = Some(PendingConfirm {
                    message: format!("Delete task {id}?"),
                    action: Command::Delete { id },
                });
                self.mode = Mode::Confirm;
            }
            Action::Refresh => return Some(Command::LoadTasks),
            Action::Help => self.mode = Mode::Help,
            Action::EditTitle => {
                let task = self.selected_task()?;
                let m = Modal::input("Edit Title", &task.title).with_subtitle(&task.id);
                self.open_modal(Mode::EditTitle, m);
            }
            Action::EditStatus => {
                let task = self.selected_task()?;
                let m = Modal::select("Edit Status", modal::status_options(), task.status.as_str())
                    .with_subtitle(&task.id);
                self.open_modal(Mode::EditStatus, m);
            }
            Action::EditPriority => {
                let task = self.selected_task()?;
                let current = task.priority.to_string();
                let m = Modal::select("Edit Priority", modal::priority_options(), &current)
                    .with_subtitle(&task.id);
                self.open_modal(Mode::EditPriority, m);
            }
            Action::EditType => {
                let task = self.selected_task()?;
                let m = Modal::select("Edit Type", modal::type_options(), &task.issue_type)
                    .with_subtitle(&task.id);
                self.open_modal(Mode::EditType, m);
            }
            Action::EditNotes => {
                let task = self.selected_task()?;
                let m = Modal::textarea("Edit Notes", &task.notes, self.width, self.height)
                    .with_subtitle(&task.id);
                self.open_modal(Mode::EditNotes, m);
            }
            Action::EditDescription => {
                let task = self.selected_task()?;
                return Some(Command::EditInEditor {
                    id: task.id.clone(),
                    initial: task.description.clone(),
                });
            }
            Action::CopyId => {
                let text = self.selected_task()?.id.clone();
                return Some(Command::CopyToClipboard { text });
            }
            Action::Search => self.search = Some(TextInput::new(&self.filter_query, 0)),
            Action::Filter => {
                let m = Modal::input("Filter", &self.filter_query);
                self.open_modal(Mode::Filter, m);
            }
            Action::ClearFilter => {
                self.filter_query.clear();
                self.redistribute();
            }
        }
        None
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let Some(input) = self.search.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                self.filter_query = input.value.trim().to_string();
                self.search = None;
                self.redistribute();
            }
            KeyCode::Esc => self.search = None,
            KeyCode::Backspace if input.is_empty() => self.search = None,
            _ => {
                input.handle_key(key.code, key.modifiers);
            }
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.mode = Mode::List;
                return None;
            }
            KeyCode::Char('?') => {
                self.mode = Mode::Help;
                return None;
            }
            _ => {}
        }
        if !scroll_viewport(&mut self.detail, &self.keymap, key) {
            return self.run_custom_command(&key, CommandContext::Detail);
        }
        None
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            self.help.goto_top();
            self.mode = Mode::List;
            return;
        }
        scroll_viewport(&mut self.help, &self.keymap, key);
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Command> {
        let ctrl_s = key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                // A validation message belongs to the form it was raised in.
                self.last_error = None;
                self.mode = Mode::List;
            }
            KeyCode::Enter => return self.submit_form(),
            _ if ctrl_s => return self.submit_form(),
            KeyCode::Tab => self.form.cycle(1),
            KeyCode::BackTab => self.form.cycle(-1),
            _ => {
                self.form.handle_key(key.code, key.modifiers);
            }
        }
        None
    }

    fn submit_form(&mut self) -> Option<Command> {
        match self.form.submit() {
            Ok(task) => {
                self.mode = Mode::List;
                Some(Command::Create(task))
            }
            Err(msg) => {
                self.last_error = Some(msg);
                None
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('y' | 'Y') => {
                self.mode = Mode::List;
                self.confirm.take().map(|c| c.action)
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.mode = Mode::List;
                self.confirm = None;
                None
            }
            _ => None,
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(value) = self.modal.as_ref().and_then(Modal::text_value) {
                    self.filter_query = value.trim().to_string();
                }
                self.close_modal();
                self.redistribute();
            }
            KeyCode::Esc => self.close_modal(),
            _ => self.feed_modal(key),
        }
    }

    fn handle_title_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Enter => {
                let title = self
                    .modal
                    .as_ref()
                    .and_then(Modal::text_value)
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default();
                self.close_modal();
                if title.is_empty() {
                    return None;
                }
                self.update_selected(TaskPatch {
                    title: Some(title),
                    ..TaskPatch::default()
                })
            }
            KeyCode::Esc => {
                self.close_modal();
                None
            }
            _ => {
                self.feed_modal(key);
                None
            }
        }
    }

    fn handle_select_key(&mut self, key: KeyEvent) -> Option<Command> {
        let shortcut = key_string(&key);
        let modal = self.modal.as_mut()?;
        if modal.select_by_shortcut(&shortcut) {
            return self.commit_selection();
        }
        match key.code {
            KeyCode::Char('k') | KeyCode::Up => modal.move_up(),
            KeyCode::Char('j') | KeyCode::Down => modal.move_down(),
            KeyCode::Enter => return self.commit_selection(),
            KeyCode::Esc => self.close_modal(),
            _ => {}
        }
        None
    }

    fn handle_notes_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
            let notes = self.modal.as_ref().and_then(Modal::text_value)?.to_string();
            self.close_modal();
            return self.update_selected(TaskPatch {
                notes: Some(notes),
                ..TaskPatch::default()
            });
        }
        if key.code == KeyCode::Esc {
            self.close_modal();
        } else {
            self.feed_modal(key);
        }
        None
    }

    // ── Mouse ─────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Option<Command> {
        let x = i32::from(mouse.column);
        let y = i32::from(mouse.row);
        let wheel = match mouse.kind {
            MouseEventKind::ScrollUp => Some(-WHEEL_STEP),
            MouseEventKind::ScrollDown => Some(WHEEL_STEP),
            _ => None,
        };
        let left_press = mouse.kind == MouseEventKind::Down(MouseButton::Left);

        match self.mode {
            Mode::List => {
                if matches!(mouse.kind, MouseEventKind::Down(_)) {
                    self.search = None;
                }
                if let Some(amount) = wheel {
                    self.panels.scroll(amount);
                } else if left_press {
                    self.click_list(x, y);
                }
                None
            }
            Mode::Detail => {
                if let Some(amount) = wheel {
                    self.detail.scroll(amount);
                } else if left_press {
                    self.mode = Mode::List;
                }
                None
            }
            Mode::Help => {
                if let Some(amount) = wheel {
                    self.help.scroll(amount);
                } else if left_press {
                    self.help.goto_top();
                    self.mode = Mode::List;
                }
                None
            }
            Mode::EditStatus | Mode::EditPriority | Mode::EditType if left_press => {
                self.click_select_modal(x, y)
            }
            _ => None,
        }
    }

    fn click_list(&mut self, x: i32, y: i32) {
        let hit = self
            .panels
            .bounds(self.width)
            .into_iter()
            .find(|(_, b)| b.contains(x, y));
        if let Some((kind, bounds)) = hit {
            // A collapsed panel only shows a summary row; focusing it is enough.
            let was_collapsed = self.panels.get(kind).collapsed;
            self.panels.focus(kind);
            if let Some(row) = hit_test::row_in_panel(&bounds, y).filter(|_| !was_collapsed) {
                self.panels.get_mut(kind).select_row(row);
            }
        }
        if hit_test::in_detail_pane(x, self.width) && self.selected_task().is_some() {
            self.open_detail();
        }
    }

    fn click_select_modal(&mut self, x: i32, y: i32) -> Option<Command> {
        let modal = self.modal.as_mut()?;
        let bounds = modal.bounds(self.width, self.height);
        match hit_test::modal_hit(&bounds, modal.option_count(), x, y) {
            ModalHit::Dismiss => {
                self.close_modal();
                None
            }
            ModalHit::Option(index) => {
                modal.select_index(index);
                self.commit_selection()
            }
            ModalHit::Inside => None,
        }
    }

    // ── Command results ───────────────────────────────────────────────

    fn handle_result(&mut self, result: CommandResult) -> Option<Command> {
        if let Some(err) = result.error() {
            self.last_error = Some(err.to_string());
            if matches!(
                result,
                CommandResult::TaskCreated(_)
                    | CommandResult::TaskUpdated { .. }
                    | CommandResult::TaskDeleted { .. }
                    | CommandResult::EditorFinished { .. }
            ) {
                self.close_modal();
                self.mode = Mode::List;
            }
            return None;
        }
        self.last_error = None;

        match result {
            CommandResult::TasksLoaded(Ok(tasks)) => {
                self.tasks = tasks;
                self.redistribute();
                None
            }
            CommandResult::TaskCreated(Ok(id)) => {
                self.status_message = Some(format!("Created {id}"));
                Some(Command::LoadTasks)
            }
            CommandResult::TaskUpdated { id, .. } => {
                self.status_message = Some(format!("Updated {id}"));
                Some(Command::LoadTasks)
            }
            CommandResult::TaskDeleted { id, .. } => {
                self.status_message = Some(format!("Deleted {id}"));
                Some(Command::LoadTasks)
            }
            CommandResult::ClipboardWritten { text, .. } => {
                self.status_message = Some(format!("Copied {text}"));
                None
            }
            CommandResult::EditorFinished {
                id,
                initial,
                result: Ok(edited),
            } => {
                if edited.trim_end() == initial.trim_end() {
                    self.status_message = Some("Description unchanged".into());
                    return None;
                }
                Some(Command::Update {
                    id,
                    patch: TaskPatch {
                        description: Some(edited.trim_end().to_string()),
                        ..TaskPatch::default()
                    },
                })
            }
            _ => None,
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────

    fn open_modal(&mut self, mode: Mode, modal: Modal) {
        self.last_error = None;
        self.modal = Some(modal);
        self.mode = mode;
    }

    fn close_modal(&mut self) {
        self.modal = None;
        self.mode = Mode::List;
    }

    fn feed_modal(&mut self, key: KeyEvent) {
        if let Some(modal) = self.modal.as_mut() {
            modal.handle_text_key(key.code, key.modifiers);
        }
    }

    /// Turn the select modal's choice into an update of whichever task is
    /// selected now. Without a selection the modal stays open.
    fn commit_selection(&mut self) -> Option<Command> {
        self.selected_task()?;
        let mode = self.mode;
        let value = self.modal.as_ref()?.selected_value()?.to_string();
        self.close_modal();
        let patch = match mode {
            Mode::EditStatus => TaskPatch {
                status: Some(TaskStatus::parse(&value)),
                ..TaskPatch::default()
            },
            Mode::EditPriority => TaskPatch {
                priority: Some(value.parse().unwrap_or(2)),
                ..TaskPatch::default()
            },
            Mode::EditType => TaskPatch {
                issue_type: Some(value),
                ..TaskPatch::default()
            },
            _ => return None,
        };
        self.update_selected(patch)
    }

    fn update_selected(&self, patch: TaskPatch) -> Option<Command> {
        let id = self.selected_task()?.id.clone();
        Some(Command::Update { id, patch })
    }

    fn open_detail(&mut self) {
        if self.selected_task().is_none() {
            return;
        }
        self.last_error = None;
        self.detail.goto_top();
        self.refresh_detail();
        self.mode = Mode::Detail;
    }

    fn refresh_detail(&mut self) {
        self.detail_lines = match self.selected_task() {
            Some(task) => ui::detail_lines(task, &self.markdown, &self.theme),
            None => vec![],
        };
        let len = ui::wrapped_len(&self.detail_lines, self.width.saturating_sub(2));
        self.detail.set_content_len(len);
    }

    fn redistribute(&mut self) {
        let visible: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| matches_query(t, &self.filter_query))
            .cloned()
            .collect();
        self.panels.distribute(&visible);
        if self.mode == Mode::Detail {
            self.refresh_detail();
        }
    }

    fn run_custom_command(&mut self, key: &KeyEvent, context: CommandContext) -> Option<Command> {
        let template = custom_command::find_match(&self.custom_commands, &key_string(key), context)?
            .command
            .clone();
        let task = self.selected_task()?;
        match custom_command::render(&template, task) {
            Ok(command) => Some(Command::ShellExec { command }),
            Err(e) => {
                tracing::warn!(error = %e, %template, "custom command template failed");
                self.last_error = Some(format!("template error: {e}"));
                None
            }
        }
    }

    pub fn panel_title(&self, kind: PanelFocus) -> String {
        format!("{} ({})", kind.title(), self.panels.get(kind).len())
    }
}

/// Apply a navigation key to a read-only viewport. Returns `false` if the
/// key is not a navigation key.
fn scroll_viewport(viewport: &mut Viewport, keymap: &KeyMap, key: KeyEvent) -> bool {
    match keymap.lookup(key.code, key.modifiers) {
        Some(Action::MoveUp) => viewport.scroll(-1),
        Some(Action::MoveDown) => viewport.scroll(1),
        Some(Action::PageUp) => viewport.half_page(false),
        Some(Action::PageDown) => viewport.half_page(true),
        Some(Action::Top) => viewport.goto_top(),
        Some(Action::Bottom) => viewport.goto_bottom(),
        _ => return false,
    }
    true
}

/// Every whitespace-separated term must appear (case-insensitively) in one
/// of the searchable fields.
pub fn matches_query(task: &Task, query: &str) -> bool {
    let haystack = [
        task.id.as_str(),
        task.title.as_str(),
        task.issue_type.as_str(),
        task.status.as_str(),
        task.assignee.as_str(),
    ]
    .into_iter()
    .chain(task.labels.iter().map(String::as_str))
    .map(str::to_lowercase)
    .collect::<Vec<_>>();

    query
        .split_whitespace()
        .map(str::to_lowercase)
        .all(|term| haystack.iter().any(|field| field.contains(&term)))
}

/// Hand the terminal to `f` (the editor) and take it back afterwards.
fn suspended<T>(terminal: &mut DefaultTerminal, f: impl FnOnce() -> T) -> Result<T> {
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();
    let out = f();
    *terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    terminal.clear()?;
    Ok(out)
}
