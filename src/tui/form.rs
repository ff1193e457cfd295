use std::ops::Range;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};

use crate::tracker::NewTask;

// ── Line editing ──────────────────────────────────────────────────────

/// Start of the word before `pos` (alt+left, ctrl+w).
pub fn word_boundary_left(s: &str, pos: usize) -> usize {
    let head = s[..pos].trim_end();
    head.rfind(char::is_whitespace)
        .map_or(0, |i| i + head[i..].chars().next().map_or(1, char::len_utf8))
}

/// Start of the word after `pos` (alt+right).
pub fn word_boundary_right(s: &str, pos: usize) -> usize {
    let rest = &s[pos..];
    rest.find(char::is_whitespace)
        .and_then(|gap| {
            rest[gap..]
                .find(|c: char| !c.is_whitespace())
                .map(|word| pos + gap + word)
        })
        .unwrap_or(s.len())
}

enum Edit {
    Move(usize),
    /// Remove the range; the cursor lands on its start.
    Delete(Range<usize>),
    Insert(char),
}

fn edit_for(buf: &str, cursor: usize, code: KeyCode, modifiers: KeyModifiers) -> Option<Edit> {
    let alt = modifiers.contains(KeyModifiers::ALT);
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let prev = cursor - buf[..cursor].chars().next_back().map_or(0, char::len_utf8);
    let next = cursor + buf[cursor..].chars().next().map_or(0, char::len_utf8);

    Some(match code {
        KeyCode::Left if alt => Edit::Move(word_boundary_left(buf, cursor)),
        KeyCode::Left => Edit::Move(prev),
        KeyCode::Right if alt => Edit::Move(word_boundary_right(buf, cursor)),
        KeyCode::Right => Edit::Move(next),
        KeyCode::Home => Edit::Move(0),
        KeyCode::End => Edit::Move(buf.len()),
        KeyCode::Backspace if alt => Edit::Delete(word_boundary_left(buf, cursor)..cursor),
        KeyCode::Char('w') if ctrl => Edit::Delete(word_boundary_left(buf, cursor)..cursor),
        KeyCode::Char('u') if ctrl => Edit::Delete(0..cursor),
        KeyCode::Backspace => Edit::Delete(prev..cursor),
        KeyCode::Delete => Edit::Delete(cursor..next),
        KeyCode::Char(c) if !ctrl && !alt => Edit::Insert(c),
        _ => return None,
    })
}

/// Apply one editing key to `buf`, moving `cursor` (a byte offset) with it.
/// Returns `false` for keys that do not edit, so callers can handle them.
pub fn apply_text_edit(
    buf: &mut String,
    cursor: &mut usize,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> bool {
    *cursor = (*cursor).min(buf.len());
    let Some(edit) = edit_for(buf, *cursor, code, modifiers) else {
        return false;
    };
    match edit {
        Edit::Move(pos) => *cursor = pos,
        Edit::Delete(range) => {
            *cursor = range.start;
            buf.replace_range(range, "");
        }
        Edit::Insert(c) => {
            buf.insert(*cursor, c);
            *cursor += c.len_utf8();
        }
    }
    true
}

/// `buf` with a block cursor drawn at byte offset `cursor`.
pub fn format_with_cursor(buf: &str, cursor: usize) -> String {
    let (head, tail) = buf.split_at(cursor.min(buf.len()));
    format!("{head}\u{2588}{tail}")
}

/// Single-line text buffer with a character limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
    /// Maximum number of characters; 0 means unlimited.
    pub limit: usize,
}

impl TextInput {
    pub fn new(value: &str, limit: usize) -> Self {
        let value: String = if limit == 0 {
            value.to_string()
        } else {
            value.chars().take(limit).collect()
        };
        TextInput {
            cursor: value.len(),
            value,
            limit,
        }
    }

    /// Returns `true` if the key was consumed. Insertions past the limit are
    /// swallowed without changing the buffer.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let inserts = matches!(code, KeyCode::Char(_))
            && !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        if inserts && self.limit > 0 && self.value.chars().count() >= self.limit {
            return true;
        }
        apply_text_edit(&mut self.value, &mut self.cursor, code, modifiers)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn display(&self) -> String {
        format_with_cursor(&self.value, self.cursor)
    }
}

// ── New task form ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Priority,
    Type,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Title,
        FormField::Description,
        FormField::Priority,
        FormField::Type,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::Priority => "Priority (0-4)",
            FormField::Type => "Type",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub fields: [TextInput; 4],
    pub focus: usize,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    pub fn new() -> Self {
        TaskForm {
            fields: [
                TextInput::new("", 200),
                TextInput::new("", 0),
                TextInput::new("2", 1),
                TextInput::new("task", 20),
            ],
            focus: 0,
        }
    }

    pub fn focused_field(&self) -> FormField {
        FormField::ALL[self.focus]
    }

    pub fn cycle(&mut self, direction: i32) {
        let n = self.fields.len() as i32;
        self.focus = (self.focus as i32 + direction).rem_euclid(n) as usize;
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.fields[self.focus].handle_key(code, modifiers)
    }

    /// Validate the form into a create request.
    pub fn submit(&self) -> Result<NewTask, String> {
        let title = self.fields[0].value.trim();
        if title.is_empty() {
            return Err("title is required".into());
        }
        let priority = match self.fields[2].value.trim() {
            "" => 2,
            raw => match raw.parse::<u8>() {
                Ok(p) if p <= 4 => p,
                _ => return Err(format!("priority must be 0-4, got {raw:?}")),
            },
        };
        let issue_type = match self.fields[3].value.trim() {
            "" => "task".to_string(),
            t => t.to_string(),
        };
        Ok(NewTask {
            title: title.to_string(),
            description: self.fields[1].value.trim().to_string(),
            priority,
            issue_type,
        })
    }
}

// ── Overlay drawing ───────────────────────────────────────────────────

/// Blank out `area` and frame it; returns the space inside the border.
pub fn render_modal(frame: &mut Frame, area: Rect, title: &str, border: Style) -> Rect {
    let block = Block::bordered()
        .title(format!(" {title} "))
        .border_style(border);
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);
    inner
}

/// One-line `key description` hint strip.
pub fn render_hints(
    frame: &mut Frame,
    area: Rect,
    hints: &[(&str, &str)],
    key_style: Style,
    desc_style: Style,
) {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for &(key, desc) in hints {
        spans.push(Span::styled(format!(" {key}"), key_style));
        spans.push(Span::styled(format!(" {desc} "), desc_style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
