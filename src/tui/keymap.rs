use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// ── Actions ──────────────────────────────────────────────────────────

/// Every discrete list-view action.
///
/// Actions are context-free identifiers; `App` decides what actually
/// happens based on the current mode and selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Help,
    Refresh,

    // Navigation
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    NextPanel,
    PrevPanel,

    // Task actions
    Select,
    Add,
    Delete,
    EditTitle,
    EditStatus,
    EditPriority,
    EditType,
    EditDescription,
    EditNotes,
    CopyId,

    // Views
    Search,
    Filter,
    ClearFilter,
}

// ── Help categories ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelpCategory {
    Navigation,
    Tasks,
    Views,
}

impl HelpCategory {
    fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::Tasks => "Tasks",
            Self::Views => "Views",
        }
    }

    /// Fixed display order for the help overlay.
    const ORDERED: &[Self] = &[Self::Navigation, Self::Tasks, Self::Views];
}

// ── Keybinding ───────────────────────────────────────────────────────

/// A single key → action mapping with metadata for the help overlay.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: Action,
    /// Key label shown in help; empty for aliases folded into another row.
    pub label: &'static str,
    pub description: &'static str,
    pub category: HelpCategory,
}

/// A single row in the help overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub label: String,
    pub description: String,
}

// ── KeyMap ────────────────────────────────────────────────────────────

/// Declarative registry of the list-view key bindings.
pub struct KeyMap {
    pub bindings: Vec<KeyBinding>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::default_keymap()
    }
}

impl KeyMap {
    pub fn default_keymap() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }

    /// Shift is ignored on character keys: terminals disagree about
    /// reporting it alongside an already-uppercase char.
    pub fn lookup(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        self.bindings
            .iter()
            .find(|kb| kb.code == code && kb.modifiers == modifiers)
            .map(|kb| kb.action)
    }

    /// Grouped help rows in display order. `extra` rows (custom commands)
    /// are appended as their own section.
    pub fn help_entries(&self, extra: &[HelpEntry]) -> Vec<(&'static str, Vec<HelpEntry>)> {
        let mut out = Vec::new();
        for &cat in HelpCategory::ORDERED {
            let entries: Vec<HelpEntry> = self
                .bindings
                .iter()
                .filter(|kb| kb.category == cat && !kb.label.is_empty())
                .map(|kb| HelpEntry {
                    label: kb.label.to_string(),
                    description: kb.description.to_string(),
                })
                .collect();
            if !entries.is_empty() {
                out.push((cat.label(), entries));
            }
        }
        if !extra.is_empty() {
            out.push(("Custom Commands", extra.to_vec()));
        }
        out
    }
}

/// Render a key event the way custom command bindings spell keys:
/// `"a"`, `"A"`, `"ctrl+o"`, `"alt+x"`, `"enter"`, `"shift+tab"`.
pub fn key_string(key: &KeyEvent) -> String {
    let base = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return format!("ctrl+{}", c.to_ascii_lowercase());
            }
            c.to_string()
        }
        KeyCode::Enter => "enter".into(),
        KeyCode::Esc => "esc".into(),
        KeyCode::Tab => "tab".into(),
        KeyCode::BackTab => return "shift+tab".into(),
        KeyCode::Backspace => "backspace".into(),
        KeyCode::Delete => "delete".into(),
        KeyCode::Up => "up".into(),
        KeyCode::Down => "down".into(),
        KeyCode::Left => "left".into(),
        KeyCode::Right => "right".into(),
        KeyCode::Home => "home".into(),
        KeyCode::End => "end".into(),
        KeyCode::PageUp => "pgup".into(),
        KeyCode::PageDown => "pgdown".into(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return String::new(),
    };
    if key.modifiers.contains(KeyModifiers::ALT) {
        format!("alt+{base}")
    } else if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("ctrl+{base}")
    } else {
        base
    }
}

// ── Default bindings ─────────────────────────────────────────────────

fn bind(
    code: KeyCode,
    modifiers: KeyModifiers,
    action: Action,
    label: &'static str,
    description: &'static str,
    category: HelpCategory,
) -> KeyBinding {
    KeyBinding {
        code,
        modifiers,
        action,
        label,
        description,
        category,
    }
}

fn alias(code: KeyCode, modifiers: KeyModifiers, action: Action) -> KeyBinding {
    bind(code, modifiers, action, "", "", HelpCategory::Navigation)
}

#[allow(clippy::enum_glob_use)]
fn default_bindings() -> Vec<KeyBinding> {
    use Action::*;
    use HelpCategory::*;
    use KeyCode::{Char, Down, End, Enter, Home, Up};
    const NONE: KeyModifiers = KeyModifiers::NONE;
    const CTRL: KeyModifiers = KeyModifiers::CONTROL;

    vec![
        // ── Navigation ───────────────────────────────────────────
        bind(Char('j'), NONE, MoveDown, "j/k", "Move down / up", Navigation),
        alias(Down, NONE, MoveDown),
        alias(Char('k'), NONE, MoveUp),
        alias(Up, NONE, MoveUp),
        bind(Char('d'), CTRL, PageDown, "ctrl+d/u", "Half page down / up", Navigation),
        alias(Char('u'), CTRL, PageUp),
        alias(KeyCode::PageDown, NONE, PageDown),
        alias(KeyCode::PageUp, NONE, PageUp),
        bind(Char('g'), NONE, Top, "g/G", "Top / bottom", Navigation),
        alias(Home, NONE, Top),
        alias(Char('G'), NONE, Bottom),
        alias(End, NONE, Bottom),
        bind(KeyCode::Tab, NONE, NextPanel, "tab", "Next panel", Navigation),
        bind(KeyCode::BackTab, KeyModifiers::SHIFT, PrevPanel, "shift+tab", "Previous panel", Navigation),
        alias(KeyCode::BackTab, NONE, PrevPanel),
        // ── Tasks ────────────────────────────────────────────────
        bind(Enter, NONE, Select, "enter", "Show details", Tasks),
        bind(Char('a'), NONE, Add, "a", "Add task", Tasks),
        bind(Char('d'), NONE, Delete, "d", "Delete task", Tasks),
        bind(Char('e'), NONE, EditTitle, "e", "Edit title", Tasks),
        bind(Char('s'), NONE, EditStatus, "s", "Change status", Tasks),
        bind(Char('p'), NONE, EditPriority, "p", "Change priority", Tasks),
        bind(Char('t'), NONE, EditType, "t", "Change type", Tasks),
        bind(Char('E'), NONE, EditDescription, "E", "Edit description in $EDITOR", Tasks),
        bind(Char('N'), NONE, EditNotes, "N", "Edit notes", Tasks),
        bind(Char('y'), NONE, CopyId, "y", "Copy task ID", Tasks),
        // ── Views ────────────────────────────────────────────────
        bind(Char('/'), NONE, Search, "/", "Search", Views),
        bind(Char('f'), NONE, Filter, "f", "Filter query", Views),
        bind(Char('F'), NONE, ClearFilter, "F", "Clear filter", Views),
        bind(Char('r'), NONE, Refresh, "r", "Refresh", Views),
        bind(Char('?'), NONE, Help, "?", "Help", Views),
        bind(Char('q'), NONE, Quit, "q", "Quit", Views),
        alias(Char('c'), CTRL, Quit),
    ]
}
