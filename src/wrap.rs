//! Word wrapping for styled lines.
//!
//! The log is drawn from lines wrapped here, without `Paragraph` wrapping, so the row count
//! used for scrolling is exactly the number of rows on screen.

use ratatui::text::{Line, Span};

enum Piece {
    Space(Vec<Span<'static>>),
    Word(Vec<Span<'static>>),
}

fn text_width(text: &str) -> usize {
    Span::raw(text).width()
}

fn spans_width(spans: &[Span<'static>]) -> usize {
    spans.iter().map(|s| s.width()).sum()
}

/// Split a line into alternating whitespace runs and words, keeping span styles
fn pieces(line: &Line<'static>) -> Vec<Piece> {
    let mut pieces: Vec<Piece> = Vec::new();

    for span in &line.spans {
        let mut run = String::new();
        let mut run_is_space = false;

        for c in span.content.chars() {
            let is_space = c.is_whitespace();
            if !run.is_empty() && is_space != run_is_space {
                push_run(&mut pieces, std::mem::take(&mut run), run_is_space, span);
            }
            run_is_space = is_space;
            run.push(c);
        }
        if !run.is_empty() {
            push_run(&mut pieces, run, run_is_space, span);
        }
    }
    pieces
}

fn push_run(pieces: &mut Vec<Piece>, text: String, is_space: bool, span: &Span<'static>) {
    let styled = Span::styled(text, span.style);
    match (pieces.last_mut(), is_space) {
        (Some(Piece::Space(spans)), true) | (Some(Piece::Word(spans)), false) => spans.push(styled),
        (_, true) => pieces.push(Piece::Space(vec![styled])),
        (_, false) => pieces.push(Piece::Word(vec![styled])),
    }
}

/// Wrap `line` to `width` columns, breaking at whitespace.
///
/// Leading whitespace (indentation) is kept; whitespace at a break is dropped. Words longer
/// than the width are split across rows. Always returns at least one line.
pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line.clone()];
    }

    let mut rows: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;
    let mut pending_space: Vec<Span<'static>> = Vec::new();
    let mut at_line_start = true;

    for piece in pieces(line) {
        let word = match piece {
            // Indentation is laid out like a word
            Piece::Space(spans) if at_line_start => spans,
            Piece::Space(spans) => {
                pending_space = spans;
                continue;
            }
            Piece::Word(spans) => spans,
        };
        at_line_start = false;

        let space_width = spans_width(&pending_space);
        let word_width = spans_width(&word);

        if current_width + space_width + word_width <= width {
            current.append(&mut pending_space);
            current.extend(word);
            current_width += space_width + word_width;
            continue;
        }

        pending_space.clear();
        if current_width > 0 {
            rows.push(Line::from(std::mem::take(&mut current)));
            current_width = 0;
        }

        if word_width <= width {
            current = word;
            current_width = word_width;
        } else {
            // Hard split a word wider than the row
            for span in word {
                for c in span.content.chars() {
                    let c_width = text_width(c.encode_utf8(&mut [0; 4]));
                    if current_width + c_width > width && current_width > 0 {
                        rows.push(Line::from(std::mem::take(&mut current)));
                        current_width = 0;
                    }
                    current.push(Span::styled(c.to_string(), span.style));
                    current_width += c_width;
                }
            }
        }
    }

    if !current.is_empty() || rows.is_empty() {
        rows.push(Line::from(current));
    }
    rows
}
