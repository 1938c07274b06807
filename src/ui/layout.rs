use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub const MAX_INPUT_ROWS: u16 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatLayout {
    pub transcript: Rect,
    pub status: Rect,
    pub input: Rect,
}

pub fn split_chat_layout(area: Rect, input_rows: u16) -> ChatLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_rows.clamp(1, MAX_INPUT_ROWS)),
        ])
        .split(area);

    ChatLayout {
        transcript: chunks[0],
        status: chunks[1],
        input: chunks[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stacks_transcript_status_input() {
        let panes = split_chat_layout(Rect::new(0, 0, 80, 20), 2);

        assert_eq!(panes.transcript.height, 17);
        assert_eq!(panes.status.height, 1);
        assert_eq!(panes.input.height, 2);
        assert_eq!(panes.transcript.y, 0);
        assert_eq!(panes.status.y, 17);
        assert_eq!(panes.input.y, 18);
    }

    #[test]
    fn layout_caps_input_height() {
        let panes = split_chat_layout(Rect::new(0, 0, 80, 30), 40);
        assert_eq!(panes.input.height, MAX_INPUT_ROWS);
        assert_eq!(panes.transcript.height, 30 - 1 - MAX_INPUT_ROWS);
    }
}
