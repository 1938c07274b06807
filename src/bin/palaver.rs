use anyhow::Result;
use crossterm::event;
use palaver::app::build_runtime;
use palaver::config::{self, Config};
use palaver::logging;
use palaver::runtime::{FrontendAdapter, UserInputEvent};
use palaver::state::Session;
use palaver::terminal;
use palaver::ui::editor::{EditorAction, InputEditor, ScrollAction};
use palaver::ui::layout::split_chat_layout;
use palaver::ui::render::{
    input_visual_rows, render_input, render_status_line, render_transcript, status_line_text,
    transcript_lines, transcript_visual_rows,
};
use std::time::Duration;

#[derive(Default)]
struct ScrollState {
    offset: usize,
    max_offset: usize,
    page: usize,
    following: bool,
}

impl ScrollState {
    fn new() -> Self {
        Self {
            following: true,
            page: 1,
            ..Self::default()
        }
    }

    fn apply(&mut self, action: ScrollAction) {
        match action {
            ScrollAction::LineUp => self.offset = self.offset.saturating_sub(1),
            ScrollAction::LineDown => self.offset = self.offset.saturating_add(1),
            ScrollAction::PageUp => self.offset = self.offset.saturating_sub(self.page),
            ScrollAction::PageDown => self.offset = self.offset.saturating_add(self.page),
            ScrollAction::Home => self.offset = 0,
            ScrollAction::End => self.offset = self.max_offset,
        }
        self.offset = self.offset.min(self.max_offset);
        self.following = self.offset >= self.max_offset;
    }

    fn resize(&mut self, total_rows: usize, viewport_rows: usize) {
        self.max_offset = total_rows.saturating_sub(viewport_rows);
        self.page = viewport_rows.saturating_sub(1).max(1);
        if self.following {
            self.offset = self.max_offset;
        } else {
            self.offset = self.offset.min(self.max_offset);
        }
    }
}

struct ManagedTuiFrontend {
    terminal: terminal::TerminalType,
    editor: InputEditor,
    scroll: ScrollState,
    model: String,
}

impl ManagedTuiFrontend {
    fn new(model: String) -> Result<Self> {
        let terminal = terminal::setup()?;
        Ok(Self {
            terminal,
            editor: InputEditor::new(),
            scroll: ScrollState::new(),
            model,
        })
    }

    fn unsent_input(&self) -> &str {
        self.editor.buffer()
    }
}

impl Drop for ManagedTuiFrontend {
    fn drop(&mut self) {
        terminal::restore();
    }
}

impl FrontendAdapter for ManagedTuiFrontend {
    fn poll_user_input(&mut self, session: &Session) -> Result<Option<UserInputEvent>> {
        while event::poll(Duration::ZERO)? {
            match self.editor.apply_event(event::read()?) {
                EditorAction::None | EditorAction::Changed => {}
                EditorAction::Scroll(action) => self.scroll.apply(action),
                EditorAction::Quit => return Ok(Some(UserInputEvent::Quit)),
                EditorAction::Submit(text) => {
                    // Keep the draft when the session will refuse it.
                    if !session.is_pending() {
                        self.editor.commit();
                        self.scroll.following = true;
                    }
                    return Ok(Some(UserInputEvent::Submit(text)));
                }
            }
        }
        Ok(None)
    }

    fn render(&mut self, session: &Session) -> Result<()> {
        let lines = transcript_lines(session);
        let input = self.editor.buffer();
        let cursor = self.editor.cursor();
        let scroll = &mut self.scroll;
        let model = self.model.as_str();

        self.terminal.draw(|frame| {
            let area = frame.area();
            let input_rows = input_visual_rows(input, area.width as usize) as u16;
            let panes = split_chat_layout(area, input_rows);

            let total_rows = transcript_visual_rows(&lines, panes.transcript.width as usize);
            scroll.resize(total_rows, panes.transcript.height as usize);
            let status = status_line_text(session, model, scroll.following);

            render_transcript(frame, panes.transcript, &lines, scroll.offset);
            render_status_line(frame, panes.status, &status);
            render_input(frame, panes.input, input, cursor);
        })?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv()?;
    let config = Config::load()?;
    config.validate()?;
    if let Err(error) = logging::init(&config) {
        eprintln!("warning: logging disabled: {error:#}");
    }

    let frontend = ManagedTuiFrontend::new(config.model.clone())?;
    let mut runtime = build_runtime(&config, frontend)?;
    let outcome = runtime.run().await;

    let unsent = runtime.frontend().unsent_input().to_string();
    drop(runtime);
    outcome?;

    println!("{unsent}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_follows_bottom_until_user_scrolls() {
        let mut scroll = ScrollState::new();
        scroll.resize(30, 10);
        assert_eq!(scroll.offset, 20);

        scroll.apply(ScrollAction::PageUp);
        assert!(!scroll.following);
        assert_eq!(scroll.offset, 11);

        scroll.resize(40, 10);
        assert_eq!(scroll.offset, 11);

        scroll.apply(ScrollAction::End);
        assert!(scroll.following);
        scroll.resize(50, 10);
        assert_eq!(scroll.offset, 40);
    }

    #[test]
    fn scroll_clamps_to_content() {
        let mut scroll = ScrollState::new();
        scroll.resize(5, 10);
        scroll.apply(ScrollAction::PageDown);
        assert_eq!(scroll.offset, 0);
        assert!(scroll.following);
        scroll.apply(ScrollAction::Home);
        assert_eq!(scroll.offset, 0);
    }
}
