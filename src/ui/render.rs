use crate::state::{Role, Session, SessionState};
use crate::ui::input_metrics::{
    char_display_width, cursor_row_col, display_width, truncate_to_display_width, wrap_lines,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const INPUT_PROMPT: &str = "┃ ";
const INPUT_PLACEHOLDER: &str = "Send a message...";
const STREAMING_CURSOR: &str = "▌";

fn sender_label(role: Role) -> (&'static str, Style) {
    match role {
        Role::User => (
            "You: ",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Role::Assistant => (
            "Claude: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    }
}

/// Styled transcript rows, one `Line` per logical line of message content.
pub fn transcript_lines(session: &Session) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in session.transcript().messages() {
        let (label, label_style) = sender_label(message.role);
        let mut content_lines = message.content.split('\n');
        let first = content_lines.next().unwrap_or_default();

        let mut spans = vec![Span::styled(label, label_style), Span::raw(first.to_string())];
        for next in content_lines {
            lines.push(Line::from(std::mem::take(&mut spans)));
            spans.push(Span::raw(next.to_string()));
        }
        if message.streaming {
            spans.push(Span::styled(
                STREAMING_CURSOR,
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(spans));
    }

    if session.state() == SessionState::Error {
        if let Some(reason) = session.last_error() {
            for (idx, row) in reason.lines().enumerate() {
                let text = if idx == 0 {
                    format!("Error: {row}")
                } else {
                    row.to_string()
                };
                lines.push(Line::styled(text, Style::default().fg(Color::Red)));
            }
        }
    }

    lines
}

pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

/// Breaks styled lines into rows no wider than `width` columns, splitting on
/// characters like [`wrap_lines`]. Row counts and drawing both go through
/// this so the scroll range matches what is on screen.
pub fn wrap_transcript_lines(lines: &[Line<'_>], width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for line in lines {
        let mut row: Vec<Span<'static>> = Vec::new();
        let mut used = 0usize;
        for span in &line.spans {
            let mut piece = String::new();
            for ch in span.content.chars() {
                let ch_width = char_display_width(ch);
                if used + ch_width > width && used > 0 {
                    if !piece.is_empty() {
                        row.push(Span::styled(std::mem::take(&mut piece), span.style));
                    }
                    rows.push(Line::from(std::mem::take(&mut row)).style(line.style));
                    used = 0;
                }
                piece.push(ch);
                used += ch_width;
            }
            if !piece.is_empty() {
                row.push(Span::styled(piece, span.style));
            }
        }
        rows.push(Line::from(row).style(line.style));
    }

    rows
}

pub fn transcript_visual_rows(lines: &[Line<'_>], width: usize) -> usize {
    wrap_transcript_lines(lines, width).len()
}

pub fn render_transcript(frame: &mut Frame<'_>, area: Rect, lines: &[Line<'_>], scroll: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let rows = wrap_transcript_lines(lines, area.width as usize);
    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(rows)
        .style(Style::default().fg(Color::White))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

pub fn status_line_text(session: &Session, model: &str, following: bool) -> String {
    let view = if following { "following" } else { "scrolled" };
    format!(
        "mode:{} model:{} messages:{} view:{}",
        session.state().label(),
        model,
        session.transcript().len(),
        view
    )
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_line(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

pub fn input_visual_rows(input: &str, width: usize) -> usize {
    wrap_lines(input, width.saturating_sub(INPUT_PROMPT.chars().count()).max(1)).len()
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width <= 2 {
        return;
    }

    let prompt_width = INPUT_PROMPT.chars().count();
    let input_width = (area.width as usize).saturating_sub(prompt_width).max(1);
    let prompt_style = Style::default().fg(Color::Magenta);

    if input.is_empty() {
        let line = Line::from(vec![
            Span::styled(INPUT_PROMPT, prompt_style),
            Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        frame.set_cursor_position((area.x.saturating_add(prompt_width as u16), area.y));
        return;
    }

    let rows = wrap_lines(input, input_width);
    let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, input_width);
    let visible_rows = area.height as usize;
    let window_start = cursor_row.saturating_add(1).saturating_sub(visible_rows);

    let rendered: Vec<Line<'_>> = (0..visible_rows)
        .map(|offset| {
            let row = rows.get(window_start + offset).cloned().unwrap_or_default();
            Line::from(vec![Span::styled(INPUT_PROMPT, prompt_style), Span::raw(row)])
        })
        .collect();
    frame.render_widget(Paragraph::new(rendered), area);

    let cursor_y = area
        .y
        .saturating_add(cursor_row.saturating_sub(window_start) as u16);
    let cursor_x = area
        .x
        .saturating_add((prompt_width + cursor_col) as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, cursor_y));
}

fn truncate_line(input: &str, width: usize) -> String {
    let width = width.max(1);
    if display_width(input) <= width {
        return input.to_string();
    }
    if width < 4 {
        return truncate_to_display_width(input, width);
    }
    let mut out = truncate_to_display_width(input, width - 3);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StreamEvent;
    use crate::state::{SessionCommand, SessionInput};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn submit(session: &mut Session, text: &str) -> u64 {
        match session.update(SessionInput::Submit(text.to_string())) {
            Some(SessionCommand::StartRequest { turn, .. }) => turn,
            other => panic!("expected start request, got {other:?}"),
        }
    }

    fn buffer_text(buffer: &Buffer) -> String {
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_transcript_lines_mark_streaming_message() {
        let mut session = Session::new();
        let turn = submit(&mut session, "hello");
        session.update(SessionInput::Stream {
            turn,
            event: StreamEvent::Delta("Hi\nthere".to_string()),
        });

        let rendered: Vec<String> = transcript_lines(&session).iter().map(line_text).collect();
        assert_eq!(rendered, vec!["You: hello", "Claude: Hi", "there▌"]);
    }

    #[test]
    fn test_transcript_lines_show_last_error() {
        let mut session = Session::new();
        let turn = submit(&mut session, "ping");
        session.update(SessionInput::Stream {
            turn,
            event: StreamEvent::Failed("connection reset".to_string()),
        });

        let rendered: Vec<String> = transcript_lines(&session).iter().map(line_text).collect();
        assert_eq!(
            rendered,
            vec!["You: ping", "Claude: ", "Error: connection reset"]
        );
    }

    #[test]
    fn test_status_line_reports_mode() {
        let mut session = Session::new();
        assert_eq!(
            status_line_text(&session, "m", true),
            "mode:ready model:m messages:0 view:following"
        );
        submit(&mut session, "hi");
        assert_eq!(
            status_line_text(&session, "m", false),
            "mode:streaming model:m messages:2 view:scrolled"
        );
    }

    #[test]
    fn test_truncate_line_adds_ellipsis() {
        assert_eq!(truncate_line("abcdefgh", 6), "abc...");
        assert_eq!(truncate_line("abc", 6), "abc");
        assert_eq!(truncate_line("abcdef", 2), "ab");
    }

    #[test]
    fn test_visual_rows_count_wrapped_lines() {
        let lines = vec![Line::from("abcdefgh"), Line::from("ab")];
        assert_eq!(transcript_visual_rows(&lines, 4), 3);
    }

    #[test]
    fn test_render_input_shows_placeholder_when_empty() {
        let mut terminal = Terminal::new(TestBackend::new(30, 1)).expect("terminal");
        terminal
            .draw(|frame| render_input(frame, frame.area(), "", 0))
            .expect("draw");
        assert!(buffer_text(terminal.backend().buffer()).contains(INPUT_PLACEHOLDER));
    }

    #[test]
    fn test_render_transcript_draws_messages() {
        let mut session = Session::new();
        submit(&mut session, "hello");
        let mut terminal = Terminal::new(TestBackend::new(30, 3)).expect("terminal");
        terminal
            .draw(|frame| render_transcript(frame, frame.area(), &transcript_lines(&session), 0))
            .expect("draw");
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("You: hello"));
        assert!(text.contains("Claude:"));
    }

    #[test]
    fn test_scrolled_to_bottom_shows_last_wrapped_row() {
        let lines = vec![Line::from("a bcd e bcd")];
        let total = transcript_visual_rows(&lines, 4);
        assert_eq!(total, 3);

        let mut terminal = Terminal::new(TestBackend::new(4, 2)).expect("terminal");
        terminal
            .draw(|frame| render_transcript(frame, frame.area(), &lines, total - 2))
            .expect("draw");
        assert_eq!(buffer_text(terminal.backend().buffer()), "d e bcd ");
    }

    #[test]
    fn test_wrapping_keeps_span_styles() {
        let mut session = Session::new();
        submit(&mut session, "abcdef");
        let rows = wrap_transcript_lines(&transcript_lines(&session), 7);

        let rendered: Vec<String> = rows.iter().map(line_text).collect();
        assert_eq!(rendered, vec!["You: ab", "cdef", "Claude:", " ▌"]);
        assert_eq!(rows[0].spans[0].content, "You: ");
        assert_eq!(rows[0].spans[0].style.fg, Some(Color::Magenta));
        assert_eq!(rows[1].spans[0].style.fg, None);
    }
}
