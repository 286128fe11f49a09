use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use crate::app::App;

const SEND_LABEL: &str = "Enviar";

pub fn render(app: &mut App, frame: &mut Frame) {
    let [log_area, input_row] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(frame.area());
    let [input_area, send_area] =
        Layout::horizontal([Constraint::Min(10), Constraint::Length(12)]).areas(input_row);

    // Store areas for mouse hit-testing
    app.log_area = Some(log_area);
    app.send_area = Some(send_area);

    render_log(app, frame, log_area);
    render_input(app, frame, input_area);
    render_send_button(app, frame, send_area);

    if let Some(message) = app.alert.as_deref() {
        render_alert(message, frame);
    }
}

fn render_log(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, used by the scroll calculations
    app.log_height = area.height.saturating_sub(2);
    app.log_width = area.width.saturating_sub(2);
    if app.follow_bottom {
        app.scroll_to_bottom();
    }

    let lines = app.transcript_lines();
    let total = lines.len().min(u16::MAX as usize) as u16;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Centelha de Ideias · {} ", app.service));

    // Lines are pre-wrapped, the paragraph must not wrap them again
    let log = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.scroll, 0));
    frame.render_widget(log, area);

    if total > app.log_height {
        let mut state = ScrollbarState::new(total.saturating_sub(app.log_height) as usize)
            .position(app.scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.input_enabled();
    let border_color = if enabled { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Mensagem (Enter envia, Esc sai) ");

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else {
        app.input_cursor.saturating_sub(inner_width.saturating_sub(1))
    };

    let content = if app.input.is_empty() {
        Line::from(Span::styled(
            app.placeholder,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        let visible: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let style = if enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Line::from(Span::styled(visible, style))
    };

    frame.render_widget(Paragraph::new(content).block(block), area);

    if enabled {
        let x = area.x + 1 + (app.input_cursor - scroll_offset) as u16;
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_send_button(app: &App, frame: &mut Frame, area: Rect) {
    let style = if app.input_enabled() {
        Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let button = Paragraph::new(Span::styled(SEND_LABEL, style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(button, area);
}

fn render_alert(message: &str, frame: &mut Frame) {
    let width = (frame.area().width * 3 / 5).max(20);
    let height = (message.lines().count() as u16 + 4).min(frame.area().height);
    let area = centered(frame.area(), width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Aviso ")
        .title_bottom(Line::from(" Enter para fechar ").right_aligned());

    let popup = Paragraph::new(message.to_string())
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::GREETINGS;
    use crate::markdown::TerminalMarkdown;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn new_app() -> App {
        App::new(Some(Box::new(TerminalMarkdown)), "localhost")
    }

    #[test]
    fn test_greetings_are_drawn() {
        let mut app = new_app();
        let screen = draw(&mut app, 120, 30);
        for greeting in GREETINGS {
            assert!(screen.contains(greeting), "missing greeting: {}", greeting);
        }
        assert!(screen.contains(SEND_LABEL));
        assert!(screen.contains("Digite sua mensagem..."));
    }

    #[test]
    fn test_send_area_recorded_for_clicks() {
        let mut app = new_app();
        draw(&mut app, 80, 24);
        let send = app.send_area.unwrap();
        assert_eq!(send.width, 12);
        assert_eq!(send.y + send.height, 24);
    }

    #[test]
    fn test_sending_shows_placeholder_and_dots() {
        let mut app = new_app();
        app.input = "ideia".to_string();
        app.input_cursor = 5;
        app.submit();

        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains("Processando, aguarde..."));
        assert!(screen.contains("ideia"));
    }

    #[test]
    fn test_alert_popup_is_drawn() {
        let mut app = new_app();
        app.alert = Some("serviço indisponível".to_string());
        let screen = draw(&mut app, 100, 30);
        assert!(screen.contains("Aviso"));
        assert!(screen.contains("serviço indisponível"));
    }

    #[test]
    fn test_log_follows_newest_entry() {
        let mut app = new_app();
        for i in 0..40 {
            app.append_message(&format!("linha {}", i), crate::message::Sender::User);
        }
        let screen = draw(&mut app, 80, 20);
        assert!(screen.contains("linha 39"));
        assert!(!screen.contains("linha 0\u{20}"));
    }

    #[test]
    fn test_log_follows_newest_entry_with_word_wrapped_replies() {
        let mut app = new_app();
        // Each reply word-wraps to three rows on a 22 column log
        for i in 0..6 {
            app.append_message(
                &format!("aaaaaaaaaaaa bbbbbbbbbbbb cccccccccccc{}", i),
                crate::message::Sender::Robot,
            );
        }
        app.append_message("ULTIMA", crate::message::Sender::Robot);

        let screen = draw(&mut app, 24, 15);
        assert!(screen.contains("ULTIMA"), "newest entry not visible:\n{}", screen);
        assert!(screen.contains("cccccccccccc5"));
    }
}
