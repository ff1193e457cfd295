use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use super::theme::Theme;

/// Turns task text (markdown) into styled lines for the detail view.
///
/// Built once when the app starts and reused for every render; styles are
/// resolved from the theme up front.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    text: Style,
    heading: Style,
    code: Style,
    bullet: Style,
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl LineBuilder {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_span(&mut self, text: String, style: Style) {
        self.current.push(Span::styled(text, style));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    /// Close the current block with a blank separator line.
    fn end_block(&mut self) {
        self.flush();
        if self.lists.is_empty() && self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }
}

impl MarkdownRenderer {
    pub fn new(theme: &Theme) -> Self {
        MarkdownRenderer {
            text: Style::default().fg(theme.text_primary),
            heading: Style::default()
                .fg(theme.heading)
                .add_modifier(Modifier::BOLD),
            code: Style::default().fg(theme.code),
            bullet: Style::default().fg(theme.text_accent),
        }
    }

    pub fn render(&self, source: &str) -> Vec<Line<'static>> {
        let mut b = LineBuilder {
            lines: vec![],
            current: vec![],
            styles: vec![self.text],
            lists: vec![],
            in_code_block: false,
        };

        for event in Parser::new(source) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    b.flush();
                    let marker = "#".repeat(heading_depth(level));
                    b.push_span(format!("{marker} "), self.heading);
                    b.styles.push(self.heading);
                }
                Event::End(TagEnd::Heading(_)) => {
                    b.styles.pop();
                    b.end_block();
                }
                Event::End(TagEnd::Paragraph) => b.end_block(),
                Event::Start(Tag::List(start)) => {
                    b.flush();
                    b.lists.push(start);
                }
                Event::End(TagEnd::List(_)) => {
                    b.lists.pop();
                    b.end_block();
                }
                Event::Start(Tag::Item) => {
                    b.flush();
                    let indent = "  ".repeat(b.lists.len().saturating_sub(1));
                    let marker = match b.lists.last_mut() {
                        Some(Some(n)) => {
                            let m = format!("{indent}{n}. ");
                            *n += 1;
                            m
                        }
                        _ => format!("{indent}• "),
                    };
                    b.push_span(marker, self.bullet);
                }
                Event::End(TagEnd::Item) => b.flush(),
                Event::Start(Tag::CodeBlock(_)) => {
                    b.flush();
                    b.in_code_block = true;
                }
                Event::End(TagEnd::CodeBlock) => {
                    b.in_code_block = false;
                    b.end_block();
                }
                Event::Start(Tag::Emphasis) => {
                    let s = b.style().add_modifier(Modifier::ITALIC);
                    b.styles.push(s);
                }
                Event::Start(Tag::Strong) => {
                    let s = b.style().add_modifier(Modifier::BOLD);
                    b.styles.push(s);
                }
                Event::End(TagEnd::Emphasis | TagEnd::Strong) => {
                    b.styles.pop();
                }
                Event::Text(text) if b.in_code_block => {
                    for line in text.lines() {
                        b.lines
                            .push(Line::from(Span::styled(format!("    {line}"), self.code)));
                    }
                }
                Event::Text(text) => {
                    let style = b.style();
                    b.push_span(text.into_string(), style);
                }
                Event::Code(code) => b.push_span(code.into_string(), self.code),
                Event::SoftBreak => {
                    let style = b.style();
                    b.push_span(" ".into(), style);
                }
                Event::HardBreak => b.flush(),
                Event::Rule => {
                    b.flush();
                    b.lines.push(Line::from(Span::styled("────────", self.bullet)));
                }
                _ => {}
            }
        }
        b.flush();
        while b.lines.last().is_some_and(|l| l.spans.is_empty()) {
            b.lines.pop();
        }
        b.lines
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
