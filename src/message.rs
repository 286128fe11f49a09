use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;

/// Who a chat message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Robot,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "Você:",
            Sender::Robot => "Centelha:",
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Sender::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Sender::Robot => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

/// A message as it sits in the conversation log, already rendered.
///
/// Entries are built once by `App::append_message` and never touched again.
#[derive(Debug, Clone)]
pub struct Entry {
    pub message: Message,
    pub body: Vec<Line<'static>>,
}

impl Entry {
    pub fn sender(&self) -> Sender {
        self.message.sender
    }

    /// Plain text of the rendered body, one string per line
    #[cfg(test)]
    pub fn body_text(&self) -> Vec<String> {
        self.body
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }
}
