use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::tracker::{Task, TaskStatus};

use super::app::{App, Mode};
use super::form::{FormField, format_with_cursor, render_hints, render_modal};
use super::hit_test::{self, Bounds};
use super::keymap::HelpEntry;
use super::markdown::MarkdownRenderer;
use super::modal::ModalKind;
use super::panel::TaskPanel;
use super::theme::Theme;

pub fn draw(frame: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    draw_panels(frame, app);
    if hit_test::is_wide(app.width) {
        let half = outer[0].width / 2;
        let preview = Rect::new(
            outer[0].x + half,
            outer[0].y,
            outer[0].width - half,
            outer[0].height,
        );
        draw_preview(frame, app, preview);
    }
    draw_status_bar(frame, app, outer[1]);

    match app.mode {
        Mode::Detail => draw_detail(frame, app, outer[0]),
        Mode::Help => draw_help(frame, app, outer[0]),
        Mode::Form => draw_form(frame, app),
        Mode::Confirm => draw_confirm(frame, app),
        Mode::Filter
        | Mode::EditTitle
        | Mode::EditStatus
        | Mode::EditPriority
        | Mode::EditType
        | Mode::EditNotes => draw_modal(frame, app),
        Mode::List => {}
    }
}

/// Clip hit-test bounds to the drawable area.
fn to_rect(b: Bounds, area: Rect) -> Rect {
    let left = b.left.max(i32::from(area.x));
    let top = b.top.max(i32::from(area.y));
    let right = b.right.min(i32::from(area.right()));
    let bottom = b.bottom.min(i32::from(area.bottom()));
    if right <= left || bottom <= top {
        return Rect::default();
    }
    Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    )
}

// ── Panels ────────────────────────────────────────────────────────────

fn draw_panels(frame: &mut Frame, app: &App) {
    let area = frame.area();
    for (kind, bounds) in app.panels.bounds(app.width) {
        let rect = to_rect(bounds, area);
        if rect.height == 0 {
            continue;
        }
        draw_panel(frame, app, app.panels.get(kind), rect);
    }
}

fn draw_panel(frame: &mut Frame, app: &App, panel: &TaskPanel, area: Rect) {
    let theme = &app.theme;
    let border_style = if panel.focused {
        theme.focused_border()
    } else {
        theme.unfocused_border()
    };
    let block = Block::default()
        .title(format!(" {} ", app.panel_title(panel.kind)))
        .borders(Borders::ALL)
        .border_style(border_style);

    if panel.collapsed {
        let summary = match panel.len() {
            0 => "  nothing closed yet".to_string(),
            1 => "  1 closed task (tab to expand)".to_string(),
            n => format!("  {n} closed tasks (tab to expand)"),
        };
        let msg = Paragraph::new(summary)
            .style(theme.dim_style())
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    if panel.is_empty() {
        let empty = if app.filter_query.is_empty() {
            "  No tasks"
        } else {
            "  No tasks match the filter"
        };
        let msg = Paragraph::new(empty).style(theme.dim_style()).block(block);
        frame.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = panel
        .items
        .iter()
        .enumerate()
        .skip(panel.offset)
        .take(panel.visible_rows())
        .map(|(i, task)| {
            let selected = panel.focused && i == panel.selected;
            let title_style = if selected {
                theme.selected_style()
            } else {
                Style::default().fg(theme.text_primary)
            };
            let mut spans = vec![
                Span::styled(
                    format!(" {} ", task.status.symbol()),
                    theme.status_style(task.status),
                ),
                Span::styled(
                    format!("{} ", task.priority_label()),
                    theme.priority_style(task.priority),
                ),
                Span::styled(format!("{} ", task.id), theme.dim_style()),
                Span::styled(task.title.clone(), title_style),
            ];
            if task.is_blocked() {
                spans.push(Span::styled(
                    " [blocked]",
                    theme.status_style(TaskStatus::Blocked),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Right half of the wide layout: the selected task, unscrolled.
fn draw_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(app.theme.unfocused_border());

    let Some(task) = app.selected_task() else {
        let msg = Paragraph::new("  Select a task to see its details")
            .style(app.theme.dim_style())
            .block(block);
        frame.render_widget(msg, area);
        return;
    };

    let lines = detail_lines(task, &app.markdown, &app.theme);
    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

// ── Detail & help ─────────────────────────────────────────────────────

/// Styled lines describing `task`: a header block of fields followed by
/// the markdown sections that are non-empty.
pub fn detail_lines(task: &Task, markdown: &MarkdownRenderer, theme: &Theme) -> Vec<Line<'static>> {
    let label = Style::default()
        .fg(theme.text_secondary)
        .add_modifier(Modifier::BOLD);
    let field = |name: &str, value: Span<'static>| {
        Line::from(vec![Span::styled(format!("{name:<10}"), label), value])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            task.title.clone(),
            Style::default()
                .fg(theme.text_primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        field("ID", Span::raw(task.id.clone())),
        field(
            "Status",
            Span::styled(task.status.as_str().to_string(), theme.status_style(task.status)),
        ),
        field(
            "Priority",
            Span::styled(task.priority_label().to_string(), theme.priority_style(task.priority)),
        ),
        field("Type", Span::raw(task.issue_type.clone())),
    ];
    if !task.assignee.is_empty() {
        lines.push(field("Assignee", Span::raw(task.assignee.clone())));
    }
    if !task.labels.is_empty() {
        lines.push(field("Labels", Span::raw(task.labels.join(", "))));
    }
    if let Some(parent) = task.parent_id() {
        lines.push(field("Parent", Span::raw(parent)));
    }
    if !task.blocked_by.is_empty() {
        lines.push(field(
            "Blocked by",
            Span::styled(task.blocked_by.join(", "), theme.error_style()),
        ));
    }
    if !task.blocks.is_empty() {
        lines.push(field("Blocks", Span::raw(task.blocks.join(", "))));
    }
    if let Some(created) = task.created_at.as_deref() {
        lines.push(field("Created", Span::styled(short_date(created), theme.dim_style())));
    }
    if let Some(updated) = task.updated_at.as_deref() {
        lines.push(field("Updated", Span::styled(short_date(updated), theme.dim_style())));
    }

    for (heading, body) in [
        ("Description", &task.description),
        ("Design", &task.design),
        ("Acceptance Criteria", &task.acceptance_criteria),
        ("Notes", &task.notes),
    ] {
        if body.trim().is_empty() {
            continue;
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            heading,
            Style::default()
                .fg(theme.heading)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));
        lines.extend(markdown.render(body));
    }
    lines
}

/// RFC 3339 timestamps shown as local `YYYY-MM-DD HH:MM`; anything else as-is.
fn short_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

/// Rows of the help overlay, custom commands included.
pub fn help_lines(app: &App) -> Vec<Line<'static>> {
    let extra: Vec<HelpEntry> = app
        .custom_commands
        .iter()
        .map(|c| HelpEntry {
            label: c.key.clone(),
            description: format!("{} ({})", c.description, c.context.as_str()),
        })
        .collect();

    let mut lines = vec![];
    for (section, entries) in app.keymap.help_entries(&extra) {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            section,
            Style::default()
                .fg(app.theme.heading)
                .add_modifier(Modifier::BOLD),
        )));
        for entry in entries {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<14}", entry.label), app.theme.key_hint_style()),
                Span::raw(entry.description),
            ]));
        }
    }
    lines
}

/// Number of rows `lines` occupies once wrapped to `width` columns.
pub fn wrapped_len(lines: &[Line<'static>], width: u16) -> usize {
    if width == 0 {
        return lines.len();
    }
    Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(width)
}

fn draw_detail(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .selected_task()
        .map_or_else(|| " Details ".to_string(), |t| format!(" {} ", t.id));
    draw_scrolled(frame, app, area, &title, app.detail_lines.clone(), app.detail.offset);
}

fn draw_help(frame: &mut Frame, app: &App, area: Rect) {
    draw_scrolled(frame, app, area, " Help ", help_lines(app), app.help.offset);
}

fn draw_scrolled(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    lines: Vec<Line<'static>>,
    offset: usize,
) {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(app.theme.focused_border());
    let scroll = u16::try_from(offset).unwrap_or(u16::MAX);
    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(body, area);
}

// ── Overlays ──────────────────────────────────────────────────────────

fn draw_modal(frame: &mut Frame, app: &App) {
    let Some(modal) = app.modal.as_ref() else {
        return;
    };
    let area = to_rect(modal.bounds(app.width, app.height), frame.area());
    if area.height < 3 {
        return;
    }
    let inner = render_modal(frame, area, &modal.title, app.theme.modal_border_style());
    if !modal.subtitle.is_empty() {
        let top = Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), 1);
        let subtitle = Line::from(Span::styled(format!(" {} ", modal.subtitle), app.theme.dim_style()));
        frame.render_widget(Paragraph::new(subtitle.right_aligned()), top);
    }

    match &modal.kind {
        ModalKind::Input(input) => {
            let lines = vec![
                Line::default(),
                Line::from(Span::raw(format!(" {}", input.display()))),
                Line::from(Span::styled(" enter save · esc cancel", app.theme.dim_style())),
            ];
            frame.render_widget(Paragraph::new(lines), inner);
        }
        ModalKind::Select { options, selected } => {
            let mut lines = vec![Line::from(Span::styled(
                " press a shortcut or enter",
                app.theme.dim_style(),
            ))];
            lines.extend(options.iter().enumerate().map(|(i, opt)| {
                let (prefix, style) = if i == *selected {
                    ("▸ ", app.theme.selected_style())
                } else {
                    ("  ", Style::default().fg(app.theme.text_primary))
                };
                Line::from(vec![
                    Span::styled(prefix, style),
                    Span::styled(format!("[{}] ", opt.shortcut), app.theme.key_hint_style()),
                    Span::styled(opt.label.clone(), style),
                ])
            }));
            frame.render_widget(Paragraph::new(lines), inner);
        }
        ModalKind::Textarea(textarea) => {
            let body = format_with_cursor(&textarea.value, textarea.cursor);
            let rows = inner.height.saturating_sub(1);
            let text_area = Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(2), rows);
            // Keep the cursor row on screen.
            let cursor_row = textarea.value[..textarea.cursor.min(textarea.value.len())]
                .matches('\n')
                .count() as u16;
            let scroll = cursor_row.saturating_sub(rows.saturating_sub(1));
            frame.render_widget(
                Paragraph::new(body)
                    .wrap(Wrap { trim: false })
                    .scroll((scroll, 0)),
                text_area,
            );
            let hint_area = Rect::new(inner.x, inner.y + rows, inner.width, 1);
            render_hints(
                frame,
                hint_area,
                &[("ctrl+s", "save"), ("esc", "cancel")],
                app.theme.key_hint_style(),
                app.theme.dim_style(),
            );
        }
    }
}

fn draw_form(frame: &mut Frame, app: &App) {
    let height = FormField::ALL.len() as i32 * 2 + 4;
    let bounds = hit_test::centered(60, height, app.width, app.height);
    let area = to_rect(bounds, frame.area());
    if area.height < 3 {
        return;
    }
    let inner = render_modal(frame, area, "New Task", app.theme.modal_border_style());

    let mut lines = vec![];
    for (i, (field, input)) in FormField::ALL.iter().zip(&app.form.fields).enumerate() {
        let focused = i == app.form.focus;
        let label_style = if focused {
            app.theme.key_hint_style()
        } else {
            app.theme.dim_style()
        };
        lines.push(Line::from(Span::styled(format!(" {}", field.label()), label_style)));
        let value = if focused {
            input.display()
        } else {
            input.value.clone()
        };
        lines.push(Line::from(Span::raw(format!("   {value}"))));
    }
    frame.render_widget(Paragraph::new(lines), inner);

    if inner.height > 0 {
        let hint_area = Rect::new(inner.x, inner.bottom() - 1, inner.width, 1);
        render_hints(
            frame,
            hint_area,
            &[("tab", "next"), ("enter", "create"), ("esc", "cancel")],
            app.theme.key_hint_style(),
            app.theme.dim_style(),
        );
    }
}

fn draw_confirm(frame: &mut Frame, app: &App) {
    let Some(confirm) = app.confirm.as_ref() else {
        return;
    };
    let width = (confirm.message.len() as i32 + 6).max(30);
    let area = to_rect(
        hit_test::centered(width, 5, app.width, app.height),
        frame.area(),
    );
    if area.height < 3 {
        return;
    }
    let inner = render_modal(frame, area, "Confirm", app.theme.error_style());
    let lines = vec![
        Line::from(Span::raw(format!(" {}", confirm.message))),
        Line::default(),
        Line::from(vec![
            Span::styled(" y", app.theme.key_hint_style()),
            Span::styled(" yes  ", app.theme.dim_style()),
            Span::styled("n", app.theme.key_hint_style()),
            Span::styled(" no", app.theme.dim_style()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

// ── Status bar ────────────────────────────────────────────────────────

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(search) = app.search.as_ref() {
        Line::from(vec![
            Span::styled(" /", app.theme.key_hint_style()),
            Span::raw(search.display()),
            Span::styled("  (enter apply, esc cancel)", app.theme.dim_style()),
        ])
    } else if let Some(err) = app.last_error.as_deref() {
        Line::from(Span::styled(format!(" {err}"), app.theme.error_style()))
    } else if let Some(msg) = app.status_message.as_deref() {
        Line::from(Span::styled(format!(" {msg}"), app.theme.success_style()))
    } else {
        let mut spans = vec![];
        if !app.filter_query.is_empty() {
            spans.push(Span::styled(
                format!(" filter: {} ", app.filter_query),
                app.theme.key_hint_style(),
            ));
        }
        spans.push(Span::styled(mode_hints(app.mode), app.theme.dim_style()));
        Line::from(spans)
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn mode_hints(mode: Mode) -> &'static str {
    match mode {
        Mode::List => " j/k:move  tab:panel  enter:view  a:add  e/s/p/t:edit  /:search  ?:help  q:quit",
        Mode::Detail => " j/k:scroll  esc:back  ?:help",
        Mode::Help => " j/k:scroll  esc:close",
        Mode::Form => " tab:next field  enter:create  esc:cancel",
        Mode::Confirm => " y:confirm  n:cancel",
        Mode::EditNotes => " ctrl+s:save  esc:cancel",
        Mode::Filter | Mode::EditTitle => " enter:save  esc:cancel",
        Mode::EditStatus | Mode::EditPriority | Mode::EditType => {
            " shortcut or j/k+enter:choose  esc:cancel"
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::config::Config;
    use crate::tui::panel::PanelFocus;
    use crate::tui::command::CommandResult;
    use crate::tui::event::AppEvent;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn sample() -> Task {
        Task {
            id: "bd-42.1".into(),
            title: "Fix the parser".into(),
            status: TaskStatus::InProgress,
            priority: 1,
            issue_type: "bug".into(),
            description: "Steps:\n\n- run it".into(),
            labels: vec!["core".into(), "parser".into()],
            ..Task::default()
        }
    }

    #[test]
    fn detail_lines_include_fields_and_sections() {
        let theme = Theme::default();
        let text = plain(&detail_lines(&sample(), &MarkdownRenderer::new(&theme), &theme));
        assert_eq!(text[0], "Fix the parser");
        assert!(text.contains(&"Status    in_progress".to_string()));
        assert!(text.contains(&"Labels    core, parser".to_string()));
        assert!(text.contains(&"Parent    bd-42".to_string()));
        assert!(text.contains(&"Description".to_string()));
        assert!(text.contains(&"• run it".to_string()));
        assert!(!text.contains(&"Notes".to_string()));
    }

    #[test]
    fn help_lists_custom_commands() {
        let mut config = Config::default();
        config.custom_commands.push(crate::config::CustomCommand {
            key: "ctrl+o".into(),
            description: "Open in browser".into(),
            context: crate::config::CommandContext::Global,
            command: "open {{.ID}}".into(),
        });
        let app = App::new(&config);
        let text = plain(&help_lines(&app));
        assert!(text.contains(&"Custom Commands".to_string()));
        assert!(
            text.iter()
                .any(|l| l.contains("ctrl+o") && l.contains("Open in browser (global)"))
        );
    }

    #[test]
    fn wrapping_grows_line_count() {
        let lines = vec![Line::from("a".repeat(25))];
        assert_eq!(wrapped_len(&lines, 10), 3);
        assert_eq!(wrapped_len(&lines, 0), 1);
    }

    #[test]
    fn draws_every_mode_without_panicking() {
        let mut app = App::new(&Config::default());
        app.resize(100, 30);
        app.handle_event(AppEvent::Completed(CommandResult::TasksLoaded(Ok(vec![
            sample(),
        ]))));
        app.panels.focus(PanelFocus::InProgress);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        for mode_key in ['?', 'a', 'd', 'e', 's', 'N', 'f'] {
            app.mode = Mode::List;
            app.modal = None;
            let key = crossterm::event::KeyEvent::from(crossterm::event::KeyCode::Char(mode_key));
            app.handle_event(AppEvent::Key(key));
            terminal.draw(|f| draw(f, &app)).unwrap();
        }
    }

    #[test]
    fn edit_modal_names_its_task() {
        let mut app = App::new(&Config::default());
        app.resize(80, 24);
        app.handle_event(AppEvent::Completed(CommandResult::TasksLoaded(Ok(vec![
            sample(),
        ]))));
        app.panels.focus(PanelFocus::InProgress);
        let key = crossterm::event::KeyEvent::from(crossterm::event::KeyCode::Char('e'));
        app.handle_event(AppEvent::Key(key));
        assert_eq!(app.mode, Mode::EditTitle);

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let buffer = terminal.backend().buffer();
        let bounds = app.modal.as_ref().unwrap().bounds(80, 24);
        let top = u16::try_from(bounds.top).unwrap();
        let border: String = (0..80u16).map(|x| buffer[(x, top)].symbol()).collect();
        assert!(border.contains("Edit Title"));
        assert!(border.contains("bd-42.1"));
    }

    #[test]
    fn status_bar_shows_error_over_hints() {
        let mut app = App::new(&Config::default());
        app.resize(80, 10);
        app.last_error = Some("bd list failed".into());
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let buffer = terminal.backend().buffer();
        let last_row: String = (0..80u16).map(|x| buffer[(x, 9)].symbol()).collect();
        assert!(last_row.contains("bd list failed"));
    }

    #[test]
    fn collapsed_closed_panel_shows_summary() {
        let mut app = App::new(&Config::default());
        app.resize(60, 20);
        let mut closed = sample();
        closed.id = "bd-9".into();
        closed.status = TaskStatus::Closed;
        app.handle_event(AppEvent::Completed(CommandResult::TasksLoaded(Ok(vec![
            closed,
        ]))));
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = (0..20u16)
            .flat_map(|y| (0..60u16).map(move |x| (x, y)))
            .map(|p| buffer[p].symbol().to_string())
            .collect();
        assert!(text.contains("1 closed task"));
    }
}
