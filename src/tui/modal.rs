use crossterm::event::{KeyCode, KeyModifiers};

use super::form::{TextInput, apply_text_edit};
use super::hit_test::{self, Bounds};

/// Maximum characters accepted by an input modal.
pub const INPUT_CHAR_LIMIT: usize = 200;
pub const INPUT_MODAL_WIDTH: i32 = 60;
const INPUT_MODAL_HEIGHT: i32 = 5;

const TEXTAREA_MIN_WIDTH: i32 = 30;
const TEXTAREA_MAX_WIDTH: i32 = 74;
const TEXTAREA_MIN_HEIGHT: i32 = 5;
const TEXTAREA_MAX_HEIGHT: i32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOption {
    pub label: String,
    pub value: String,
    pub shortcut: String,
}

impl ModalOption {
    pub fn new(label: &str, value: &str, shortcut: &str) -> Self {
        ModalOption {
            label: label.into(),
            value: value.into(),
            shortcut: shortcut.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextArea {
    pub value: String,
    pub cursor: usize,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalKind {
    Input(TextInput),
    Select {
        options: Vec<ModalOption>,
        /// Always a valid index when `options` is non-empty.
        selected: usize,
    },
    Textarea(TextArea),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub title: String,
    /// Shown in the top border, e.g. the ID of the task being edited.
    pub subtitle: String,
    pub kind: ModalKind,
}

impl Modal {
    pub fn input(title: &str, value: &str) -> Self {
        Modal {
            title: title.into(),
            subtitle: String::new(),
            kind: ModalKind::Input(TextInput::new(value, INPUT_CHAR_LIMIT)),
        }
    }

    /// Preselects the option whose value equals `current`, else the first.
    pub fn select(title: &str, options: Vec<ModalOption>, current: &str) -> Self {
        let selected = options.iter().position(|o| o.value == current).unwrap_or(0);
        Modal {
            title: title.into(),
            subtitle: String::new(),
            kind: ModalKind::Select { options, selected },
        }
    }

    /// The editing area scales with the screen within fixed bounds.
    pub fn textarea(title: &str, value: &str, screen_w: u16, screen_h: u16) -> Self {
        let width = (i32::from(screen_w) * 4 / 5 - 6).clamp(TEXTAREA_MIN_WIDTH, TEXTAREA_MAX_WIDTH);
        let height = (i32::from(screen_h) / 2 - 4).clamp(TEXTAREA_MIN_HEIGHT, TEXTAREA_MAX_HEIGHT);
        Modal {
            title: title.into(),
            subtitle: String::new(),
            kind: ModalKind::Textarea(TextArea {
                value: value.into(),
                cursor: value.len(),
                width,
                height,
            }),
        }
    }

    #[must_use]
    pub fn with_subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn move_up(&mut self) {
        if let ModalKind::Select { selected, .. } = &mut self.kind {
            *selected = selected.saturating_sub(1);
        }
    }

    pub fn move_down(&mut self) {
        if let ModalKind::Select { options, selected } = &mut self.kind {
            if *selected + 1 < options.len() {
                *selected += 1;
            }
        }
    }

    /// Select the option bound to `key`. Returns `false` without touching
    /// state when this is not a select modal or nothing matches.
    pub fn select_by_shortcut(&mut self, key: &str) -> bool {
        let ModalKind::Select { options, selected } = &mut self.kind else {
            return false;
        };
        match options.iter().position(|o| o.shortcut == key) {
            Some(i) => {
                *selected = i;
                true
            }
            None => false,
        }
    }

    /// Select by index (mouse). Out-of-range indices are ignored.
    pub fn select_index(&mut self, index: usize) -> bool {
        match &mut self.kind {
            ModalKind::Select { options, selected } if index < options.len() => {
                *selected = index;
                true
            }
            _ => false,
        }
    }

    pub fn selected_value(&self) -> Option<&str> {
        match &self.kind {
            ModalKind::Select { options, selected } => {
                options.get(*selected).map(|o| o.value.as_str())
            }
            _ => None,
        }
    }

    /// Current text of an input or textarea modal.
    pub fn text_value(&self) -> Option<&str> {
        match &self.kind {
            ModalKind::Input(input) => Some(&input.value),
            ModalKind::Textarea(area) => Some(&area.value),
            ModalKind::Select { .. } => None,
        }
    }

    pub fn option_count(&self) -> usize {
        match &self.kind {
            ModalKind::Select { options, .. } => options.len(),
            _ => 0,
        }
    }

    /// Outer size in cells, borders included.
    pub fn size(&self) -> (i32, i32) {
        match &self.kind {
            ModalKind::Input(_) => (INPUT_MODAL_WIDTH, INPUT_MODAL_HEIGHT),
            ModalKind::Select { options, .. } => {
                (hit_test::SELECT_MODAL_WIDTH, options.len() as i32 + 4)
            }
            ModalKind::Textarea(area) => (area.width + 4, area.height + 4),
        }
    }

    pub fn bounds(&self, screen_w: u16, screen_h: u16) -> Bounds {
        let (w, h) = self.size();
        hit_test::centered(w, h, screen_w, screen_h)
    }

    /// Feed a key to the text buffer. Enter inserts a newline in a textarea.
    /// Returns `true` if the key was consumed.
    pub fn handle_text_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match &mut self.kind {
            ModalKind::Input(input) => input.handle_key(code, modifiers),
            ModalKind::Textarea(area) => {
                if code == KeyCode::Enter {
                    area.cursor = area.cursor.min(area.value.len());
                    area.value.insert(area.cursor, '\n');
                    area.cursor += 1;
                    return true;
                }
                apply_text_edit(&mut area.value, &mut area.cursor, code, modifiers)
            }
            ModalKind::Select { .. } => false,
        }
    }
}

pub fn status_options() -> Vec<ModalOption> {
    vec![
        ModalOption::new("Open", "open", "o"),
        ModalOption::new("In Progress", "in_progress", "i"),
        ModalOption::new("Closed", "closed", "c"),
    ]
}

pub fn priority_options() -> Vec<ModalOption> {
    vec![
        ModalOption::new("P0 - Critical", "0", "0"),
        ModalOption::new("P1 - High", "1", "1"),
        ModalOption::new("P2 - Medium", "2", "2"),
        ModalOption::new("P3 - Low", "3", "3"),
        ModalOption::new("P4 - Backlog", "4", "4"),
    ]
}

pub fn type_options() -> Vec<ModalOption> {
    vec![
        ModalOption::new("Task", "task", "t"),
        ModalOption::new("Bug", "bug", "b"),
        ModalOption::new("Feature", "feature", "f"),
        ModalOption::new("Epic", "epic", "e"),
        ModalOption::new("Chore", "chore", "r"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(modal: &Modal) -> usize {
        match modal.kind {
            ModalKind::Select { selected, .. } => selected,
            _ => panic!("not a select modal"),
        }
    }

    #[test]
    fn select_preselects_current_value() {
        let modal = Modal::select("Priority", priority_options(), "2");
        assert_eq!(selected(&modal), 2);
        assert_eq!(modal.selected_value(), Some("2"));
    }

    #[test]
    fn select_defaults_to_first_option() {
        let modal = Modal::select("Type", type_options(), "spike");
        assert_eq!(selected(&modal), 0);
    }

    #[test]
    fn move_down_clamps_at_last_option() {
        let mut modal = Modal::select("Priority", priority_options(), "2");
        modal.move_down();
        modal.move_down();
        assert_eq!(selected(&modal), 4);
        modal.move_down();
        assert_eq!(selected(&modal), 4);
    }

    #[test]
    fn move_up_clamps_at_first_option() {
        let mut modal = Modal::select("Status", status_options(), "open");
        modal.move_up();
        assert_eq!(selected(&modal), 0);
    }

    #[test]
    fn shortcut_selects_matching_option() {
        let mut modal = Modal::select("Status", status_options(), "open");
        assert!(modal.select_by_shortcut("c"));
        assert_eq!(modal.selected_value(), Some("closed"));
    }

    #[test]
    fn shortcut_without_match_is_noop() {
        let mut modal = Modal::select("Status", status_options(), "in_progress");
        let before = modal.clone();
        assert!(!modal.select_by_shortcut("z"));
        assert_eq!(modal, before);
    }

    #[test]
    fn shortcut_on_input_modal_is_noop() {
        let mut modal = Modal::input("Title", "hello");
        let before = modal.clone();
        assert!(!modal.select_by_shortcut("o"));
        assert_eq!(modal, before);
    }

    #[test]
    fn navigation_ignored_outside_select() {
        let mut modal = Modal::input("Title", "hello");
        modal.move_down();
        modal.move_up();
        assert_eq!(modal.text_value(), Some("hello"));
        assert_eq!(modal.selected_value(), None);
    }

    #[test]
    fn select_size_matches_hit_testing() {
        let modal = Modal::select("Status", status_options(), "open");
        assert_eq!(modal.size(), (40, 7));
        assert_eq!(modal.bounds(100, 40), hit_test::select_modal_bounds(3, 100, 40));
    }

    #[test]
    fn textarea_size_is_clamped() {
        let tiny = Modal::textarea("Notes", "", 20, 10);
        let ModalKind::Textarea(ref area) = tiny.kind else {
            panic!("not a textarea");
        };
        assert_eq!((area.width, area.height), (30, 5));

        let huge = Modal::textarea("Notes", "", 300, 100);
        let ModalKind::Textarea(ref area) = huge.kind else {
            panic!("not a textarea");
        };
        assert_eq!((area.width, area.height), (74, 20));
    }

    #[test]
    fn textarea_enter_inserts_newline() {
        let mut modal = Modal::textarea("Notes", "a", 100, 40);
        modal.handle_text_key(KeyCode::Enter, KeyModifiers::NONE);
        modal.handle_text_key(KeyCode::Char('b'), KeyModifiers::NONE);
        assert_eq!(modal.text_value(), Some("a\nb"));
    }

    #[test]
    fn subtitle_is_empty_until_set() {
        let modal = Modal::input("Edit Title", "x");
        assert!(modal.subtitle.is_empty());
        let modal = modal.with_subtitle("bd-3");
        assert_eq!(modal.subtitle, "bd-3");
        assert_eq!(modal.size(), Modal::input("Edit Title", "x").size());
    }

    #[test]
    fn input_modal_limits_length() {
        let long = "x".repeat(250);
        let modal = Modal::input("Title", &long);
        assert_eq!(modal.text_value().map(str::len), Some(INPUT_CHAR_LIMIT));
    }
}
