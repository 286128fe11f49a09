//! Markdown to styled terminal lines.
//!
//! Replies from the idea service are Markdown (headings, bold section titles, bullet lists).
//! The controller only sees the [`MarkdownRenderer`] trait, so it can run with the
//! pulldown-cmark renderer, with no renderer at all, or with a test double.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Deepest block nesting (quotes, lists, items) the renderer will follow
pub const MAX_NESTING: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("markdown nesting deeper than {limit} levels")]
    TooDeep { limit: usize },
}

pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, text: &str) -> Result<Vec<Line<'static>>, RenderError>;
}

/// pulldown-cmark backed renderer producing ratatui lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalMarkdown;

impl MarkdownRenderer for TerminalMarkdown {
    fn render(&self, text: &str) -> Result<Vec<Line<'static>>, RenderError> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut writer = LineWriter::new();
        for event in Parser::new_ext(text, options) {
            writer.process(event)?;
        }
        Ok(writer.finish())
    }
}

struct LineWriter {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    /// Inline style stack, innermost last
    styles: Vec<Style>,
    /// One entry per open list: `Some(next number)` for ordered lists
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    depth: usize,
    in_code_block: bool,
}

impl LineWriter {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            quote_depth: 0,
            depth: 0,
            in_code_block: false,
        }
    }

    fn process(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.start_tag(tag)?,
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                let style = self.current_style().fg(Color::Yellow);
                self.spans.push(Span::styled(code.into_string(), style));
            }
            Event::SoftBreak => self.spans.push(Span::raw(" ")),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(24),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.spans.push(Span::raw(marker));
            }
            // Raw HTML never reaches the terminal
            Event::Html(_) | Event::InlineHtml(_) => {}
            _ => {}
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'_>) -> Result<(), RenderError> {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let style = match level {
                    HeadingLevel::H1 | HeadingLevel::H2 => Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    _ => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                };
                self.push_style(style);
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.enter_block()?;
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(Line::from(Span::styled(
                            format!("  [{}]", lang),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                }
            }
            Tag::List(start) => {
                self.flush_line();
                self.enter_block()?;
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                self.enter_block()?;
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}{}. ", indent, n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{}• ", indent),
                };
                self.spans
                    .push(Span::styled(marker, Style::default().fg(Color::Yellow)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { .. } => self.push_style(
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            _ => {}
        }
        Ok(())
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.styles.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.leave_block();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
                self.leave_block();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                self.flush_line();
                self.leave_block();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.styles.pop();
            }
            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if self.in_code_block {
            let style = Style::default().fg(Color::Green);
            for line in text.lines() {
                self.lines
                    .push(Line::from(Span::styled(format!("  {}", line), style)));
            }
            return;
        }
        let style = self.current_style();
        self.spans.push(Span::styled(text.to_string(), style));
    }

    fn enter_block(&mut self) -> Result<(), RenderError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(RenderError::TooDeep { limit: MAX_NESTING });
        }
        Ok(())
    }

    fn leave_block(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn current_style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: Style) {
        let patched = self.current_style().patch(style);
        self.styles.push(patched);
    }

    fn flush_line(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.spans.len() + 1);
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.append(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.lines
    }
}
