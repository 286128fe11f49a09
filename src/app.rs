use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::client::SendError;
use crate::markdown::MarkdownRenderer;
use crate::message::{Entry, Message, Sender};
use crate::wrap::wrap_line;

/// Shown once, in this order, when the app starts
pub const GREETINGS: [&str; 2] = [
    "Olá, como posso ajudar a ter ideias?",
    "Lembre, ajudaria muito se deixasse claro o tema, o tipo do projeto e seus interesses",
];

pub const PLACEHOLDER_IDLE: &str = "Digite sua mensagem...";
pub const PLACEHOLDER_SENDING: &str = "Processando, aguarde...";

pub const RENDER_FAILURE_PREFIX: &str = "Erro ao exibir mensagem formatada:\n";
pub const CONNECTION_FAILED: &str =
    "Falha na conexão com o serviço de ideias. Tente novamente mais tarde.";
pub const UNREADABLE_REPLY: &str = "Não foi possível ler a resposta do serviço de ideias.";

/// Whether a request is in flight. Only one may be outstanding at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Sending,
}

pub struct App {
    pub should_quit: bool,
    pub state: ChatState,

    // Conversation log, append only
    pub entries: Vec<Entry>,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in chars
    pub placeholder: &'static str,

    /// Modal message for errors reported by the service
    pub alert: Option<String>,

    // Log view
    pub scroll: u16,
    pub follow_bottom: bool,
    pub log_height: u16, // inner size, updated during render
    pub log_width: u16,

    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Areas for mouse hit-testing (updated during render)
    pub log_area: Option<Rect>,
    pub send_area: Option<Rect>,

    /// Shown in the log title
    pub service: String,

    renderer: Option<Box<dyn MarkdownRenderer>>,
}

impl App {
    /// `renderer` is `None` when Markdown is unavailable; replies then show as typed.
    pub fn new(renderer: Option<Box<dyn MarkdownRenderer>>, service: impl Into<String>) -> Self {
        let mut app = Self {
            should_quit: false,
            state: ChatState::Idle,
            entries: Vec::new(),
            input: String::new(),
            input_cursor: 0,
            placeholder: PLACEHOLDER_IDLE,
            alert: None,
            scroll: 0,
            follow_bottom: true,
            log_height: 0,
            log_width: 0,
            animation_frame: 0,
            log_area: None,
            send_area: None,
            service: service.into(),
            renderer,
        };

        for greeting in GREETINGS {
            app.append_message(greeting, Sender::Robot);
        }
        app
    }

    pub fn input_enabled(&self) -> bool {
        self.state == ChatState::Idle && self.alert.is_none()
    }

    /// Render `text` for `sender` and add it to the end of the log
    pub fn append_message(&mut self, text: &str, sender: Sender) {
        let body = match sender {
            Sender::User => plain_lines(text),
            Sender::Robot => {
                self.placeholder = PLACEHOLDER_IDLE;
                self.render_robot(text)
            }
        };

        self.entries.push(Entry {
            message: Message {
                text: text.to_string(),
                sender,
            },
            body,
        });
        self.scroll_to_bottom();
    }

    fn render_robot(&self, text: &str) -> Vec<Line<'static>> {
        let Some(renderer) = self.renderer.as_ref() else {
            return plain_lines(text);
        };

        match renderer.render(text) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!(error = %e, "markdown rendering failed, showing raw text");
                plain_lines(&format!("{}{}", RENDER_FAILURE_PREFIX, text))
            }
        }
    }

    /// Send-button / Enter action.
    ///
    /// Returns the trimmed text that must be sent, or `None` when nothing should happen
    /// (blank input, a request already in flight, or an open alert).
    pub fn submit(&mut self) -> Option<String> {
        if !self.input_enabled() {
            return None;
        }

        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }

        self.append_message(&text, Sender::User);
        self.state = ChatState::Sending;
        self.placeholder = PLACEHOLDER_SENDING;
        self.input.clear();
        self.input_cursor = 0;
        self.animation_frame = 0;
        Some(text)
    }

    /// Apply the outcome of the request started by `submit`. Always returns to `Idle`.
    pub fn finish_send(&mut self, outcome: Result<String, SendError>) {
        match outcome {
            Ok(text) => self.append_message(&text, Sender::Robot),
            Err(SendError::Rejected { status, message }) => {
                tracing::warn!(%status, "showing service error");
                self.alert = Some(message);
            }
            Err(e @ (SendError::Transport(_) | SendError::TaskFailed(_))) => {
                tracing::error!(error = %e, "request did not complete");
                self.append_message(CONNECTION_FAILED, Sender::Robot);
            }
            Err(SendError::MalformedReply(reason)) => {
                tracing::warn!(%reason, "unreadable reply");
                self.append_message(UNREADABLE_REPLY, Sender::Robot);
            }
        }

        self.state = ChatState::Idle;
        self.placeholder = PLACEHOLDER_IDLE;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.state == ChatState::Sending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Everything the log panel shows, wrapped to the current width.
    ///
    /// The panel draws exactly these lines, so their count is the scroll extent.
    pub fn transcript_lines(&self) -> Vec<Line<'static>> {
        // Default to 50 columns before the first render
        let wrap_width = if self.log_width > 0 {
            self.log_width as usize
        } else {
            50
        };

        let mut lines: Vec<Line<'static>> = Vec::new();
        for entry in &self.entries {
            let sender = entry.sender();
            lines.push(Line::from(Span::styled(sender.label(), sender.style())));
            for line in &entry.body {
                lines.extend(wrap_line(line, wrap_width));
            }
            lines.push(Line::default());
        }

        if self.state == ChatState::Sending {
            lines.push(Line::from(Span::styled(
                Sender::Robot.label(),
                Sender::Robot.style(),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((self.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                dots,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }

    pub fn transcript_rows(&self) -> u16 {
        self.transcript_lines().len().min(u16::MAX as usize) as u16
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.log_height > 0 {
            self.log_height
        } else {
            20
        };
        self.transcript_rows().saturating_sub(visible_height)
    }

    /// Scroll so the newest entry is visible
    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_sub(rows);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, rows: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(rows).min(max);
        self.follow_bottom = self.scroll >= max;
    }

    pub fn page_size(&self) -> u16 {
        (self.log_height / 2).max(1)
    }
}

fn plain_lines(text: &str) -> Vec<Line<'static>> {
    let lines: Vec<Line<'static>> = text.lines().map(|l| Line::from(l.to_string())).collect();
    if lines.is_empty() {
        vec![Line::default()]
    } else {
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{RenderError, TerminalMarkdown};
    use ratatui::style::Modifier;
    use reqwest::StatusCode;

    struct FailingRenderer;

    impl MarkdownRenderer for FailingRenderer {
        fn render(&self, _text: &str) -> Result<Vec<Line<'static>>, RenderError> {
            Err(RenderError::TooDeep { limit: 0 })
        }
    }

    fn markdown_app() -> App {
        App::new(Some(Box::new(TerminalMarkdown)), "test")
    }

    fn type_text(app: &mut App, text: &str) {
        app.input = text.to_string();
        app.input_cursor = text.chars().count();
    }

    /// Builds a real transport error by connecting to a closed port
    async fn transport_error() -> SendError {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        reqwest::get(url).await.unwrap_err().into()
    }

    #[test]
    fn test_greetings_on_start() {
        let app = markdown_app();
        assert_eq!(app.entries.len(), 2);
        for (entry, greeting) in app.entries.iter().zip(GREETINGS) {
            assert_eq!(entry.sender(), Sender::Robot);
            assert_eq!(entry.message.text, greeting);
        }
        assert_eq!(app.state, ChatState::Idle);
    }

    #[test]
    fn test_submit_appends_user_message_before_sending() {
        let mut app = markdown_app();
        type_text(&mut app, "  uma horta vertical  ");

        let sent = app.submit();

        assert_eq!(sent.as_deref(), Some("uma horta vertical"));
        assert_eq!(app.entries.len(), 3);
        let last = app.entries.last().unwrap();
        assert_eq!(last.sender(), Sender::User);
        assert_eq!(last.message.text, "uma horta vertical");
        assert_eq!(app.state, ChatState::Sending);
        assert!(app.input.is_empty());
        assert_eq!(app.input_cursor, 0);
        assert_eq!(app.placeholder, PLACEHOLDER_SENDING);
        assert!(!app.input_enabled());
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut app = markdown_app();
        for blank in ["", "   ", "\t\n"] {
            type_text(&mut app, blank);
            assert_eq!(app.submit(), None);
        }
        assert_eq!(app.entries.len(), 2);
        assert_eq!(app.state, ChatState::Idle);
    }

    #[test]
    fn test_submit_while_sending_is_refused() {
        let mut app = markdown_app();
        type_text(&mut app, "primeira");
        assert!(app.submit().is_some());

        type_text(&mut app, "segunda");
        assert_eq!(app.submit(), None);
        assert_eq!(app.entries.len(), 3);
        assert_eq!(app.input, "segunda");
    }

    #[test]
    fn test_success_appends_rendered_robot_reply() {
        let mut app = markdown_app();
        type_text(&mut app, "ideia");
        app.submit();

        app.finish_send(Ok("**X**".to_string()));

        assert_eq!(app.entries.len(), 4);
        let reply = app.entries.last().unwrap();
        assert_eq!(reply.sender(), Sender::Robot);
        assert_eq!(reply.message.text, "**X**");
        assert_eq!(reply.body_text(), vec!["X"]);
        assert!(reply.body[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(app.state, ChatState::Idle);
        assert_eq!(app.placeholder, PLACEHOLDER_IDLE);
    }

    #[test]
    fn test_reply_without_renderer_is_literal() {
        let mut app = App::new(None, "test");
        type_text(&mut app, "ideia");
        app.submit();

        app.finish_send(Ok("**X**".to_string()));

        assert_eq!(app.entries.last().unwrap().body_text(), vec!["**X**"]);
    }

    #[test]
    fn test_service_error_raises_alert_without_logging_it() {
        let mut app = markdown_app();
        type_text(&mut app, "ideia");
        app.submit();

        app.finish_send(Err(SendError::Rejected {
            status: StatusCode::NOT_FOUND,
            message: "err".to_string(),
        }));

        assert_eq!(app.entries.len(), 3);
        assert_eq!(app.alert.as_deref(), Some("err"));
        assert_eq!(app.state, ChatState::Idle);

        // Alert blocks input until dismissed
        type_text(&mut app, "de novo");
        assert_eq!(app.submit(), None);
        app.dismiss_alert();
        assert!(app.input_enabled());
        assert_eq!(app.submit().as_deref(), Some("de novo"));
    }

    #[tokio::test]
    async fn test_transport_error_shows_connection_message() {
        let mut app = markdown_app();
        type_text(&mut app, "ideia");
        app.submit();

        app.finish_send(Err(transport_error().await));

        let reply = app.entries.last().unwrap();
        assert_eq!(reply.sender(), Sender::Robot);
        assert_eq!(reply.message.text, CONNECTION_FAILED);
        assert_eq!(app.state, ChatState::Idle);
        assert!(app.input_enabled());
    }

    #[test]
    fn test_task_failure_shows_connection_message() {
        let mut app = markdown_app();
        type_text(&mut app, "ideia");
        app.submit();

        app.finish_send(Err(SendError::TaskFailed("cancelled".to_string())));

        assert_eq!(app.entries.last().unwrap().message.text, CONNECTION_FAILED);
        assert_eq!(app.state, ChatState::Idle);
    }

    #[test]
    fn test_malformed_reply_is_reported() {
        let mut app = markdown_app();
        type_text(&mut app, "ideia");
        app.submit();

        app.finish_send(Err(SendError::MalformedReply("missing".to_string())));

        assert_eq!(app.entries.last().unwrap().message.text, UNREADABLE_REPLY);
        assert_eq!(app.state, ChatState::Idle);
    }

    #[test]
    fn test_render_failure_shows_raw_text() {
        let mut app = App::new(Some(Box::new(FailingRenderer)), "test");
        app.append_message("# título", Sender::Robot);

        let body = app.entries.last().unwrap().body_text();
        assert_eq!(body, vec!["Erro ao exibir mensagem formatada:", "# título"]);
    }

    #[test]
    fn test_user_text_is_never_rendered() {
        let mut app = markdown_app();
        app.append_message("**não negrito**", Sender::User);
        assert_eq!(app.entries.last().unwrap().body_text(), vec!["**não negrito**"]);
    }

    #[test]
    fn test_append_follows_bottom() {
        let mut app = markdown_app();
        app.log_height = 4;
        app.log_width = 20;
        for i in 0..10 {
            app.append_message(&format!("mensagem {}", i), Sender::User);
        }
        assert!(app.follow_bottom);
        assert_eq!(app.scroll, app.transcript_rows() - 4);

        app.scroll_up(3);
        assert!(!app.follow_bottom);
        app.append_message("nova", Sender::Robot);
        assert!(app.follow_bottom);
        assert_eq!(app.scroll, app.transcript_rows() - 4);
    }

    #[test]
    fn test_scroll_down_stops_at_bottom() {
        let mut app = markdown_app();
        app.log_height = 2;
        app.log_width = 80;
        app.scroll_up(100);
        assert_eq!(app.scroll, 0);

        app.scroll_down(1000);
        assert_eq!(app.scroll, app.transcript_rows() - 2);
        assert!(app.follow_bottom);
    }

    #[test]
    fn test_scroll_down_by_huge_amount_clamps() {
        let mut app = markdown_app();
        app.log_height = 2;
        app.log_width = 80;
        app.scroll = 5;

        app.scroll_down(u16::MAX);

        assert_eq!(app.scroll, app.transcript_rows() - 2);
        assert!(app.follow_bottom);
    }

    #[test]
    fn test_rows_count_word_wrapped_replies() {
        let mut app = App::new(None, "test");
        app.log_width = 22;
        let before = app.transcript_rows();

        // 38 columns, two rows by width but three at word boundaries
        app.append_message("aaaaaaaaaaaa bbbbbbbbbbbb cccccccccccc5", Sender::Robot);

        // label + three body rows + blank separator
        assert_eq!(app.transcript_rows(), before + 5);
    }

    #[test]
    fn test_animation_only_while_sending() {
        let mut app = markdown_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        type_text(&mut app, "ideia");
        app.submit();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
