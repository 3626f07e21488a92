use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::{io, time::Duration};

use super::ChatInterface;
use crate::core::session::ConnectionState;

/// Longer drafts (usually pastes) are shown as a placeholder.
const PASTE_DISPLAY_THRESHOLD: usize = 100;

fn byte_index(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

impl ChatInterface {
    pub async fn run_tui(&mut self) -> Result<()> {
        self.spawn_health_check();
        self.scroll_to_bottom();

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_app(&mut terminal).await;

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;

        if res.is_ok() {
            crate::core::terminal::print_goodbye();
        }
        res
    }

    async fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        <B as Backend>::Error: std::error::Error + Send + Sync + 'static,
    {
        loop {
            if self.should_quit {
                return Ok(());
            }

            self.drain_backend_events();

            if self.session.is_busy() || self.session.connection() == ConnectionState::Checking {
                self.spinner_tick = self.spinner_tick.wrapping_add(1);
            }

            let draft = self.session.draft().to_string();
            let draft_chars = draft.chars().count();
            let awaiting_approval = self.awaiting_approval();
            let cmd_output_visible = self.cmd_output_visible;
            let autocomplete_visible = self.autocomplete_visible;

            terminal.draw(|f| {
                let mut constraints = vec![Constraint::Min(1)];
                if cmd_output_visible {
                    let output_height = (self.cmd_output_lines.len() as u16 + 2).min(12);
                    constraints.push(Constraint::Length(output_height));
                }
                if awaiting_approval {
                    constraints.push(Constraint::Length(self.approval_height()));
                }
                constraints.push(Constraint::Length(3));

                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints(constraints)
                    .split(f.area());

                let mut idx = 0;
                let chat_widget = self.render_messages(chunks[idx]);
                f.render_widget(chat_widget, chunks[idx]);

                if cmd_output_visible {
                    idx += 1;
                    f.render_widget(self.render_cmd_output(), chunks[idx]);
                }
                if awaiting_approval {
                    idx += 1;
                    f.render_widget(self.render_approval(), chunks[idx]);
                }
                let input_idx = idx + 1;

                let prompt_label = if awaiting_approval { "y/n > " } else { "ask > " };
                let displayed_input = if awaiting_approval {
                    String::new()
                } else if draft_chars > PASTE_DISPLAY_THRESHOLD {
                    format!("[Pasted content - {} chars]", draft_chars)
                } else {
                    draft.clone()
                };
                let input_text = format!("{}{}", prompt_label, displayed_input);

                let input_style = if self.session.is_busy()
                    || self.session.connection() != ConnectionState::Connected
                {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::White)
                };

                let input_widget = Paragraph::new(input_text)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(Color::DarkGray)),
                    )
                    .style(input_style);
                f.render_widget(input_widget, chunks[input_idx]);

                if autocomplete_visible && !self.autocomplete_candidates.is_empty() {
                    let (popup_widget, popup_area) = self.render_autocomplete(chunks[input_idx]);
                    f.render_widget(Clear, popup_area);
                    f.render_widget(popup_widget, popup_area);
                }

                let cursor_display_len = if draft_chars > PASTE_DISPLAY_THRESHOLD {
                    displayed_input.chars().count()
                } else if awaiting_approval {
                    0
                } else {
                    self.cursor_pos
                };
                let cursor_x = chunks[input_idx].x
                    + 1
                    + prompt_label.len() as u16
                    + cursor_display_len as u16;
                let cursor_y = chunks[input_idx].y + 1;
                f.set_cursor_position((cursor_x, cursor_y));
            })?;

            // Short timeout keeps the spinner moving.
            if crossterm::event::poll(Duration::from_millis(80))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Paste(data) => self.handle_paste(&data),
                    _ => {}
                }
            }
        }
    }

    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.awaiting_approval() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.resolve_pending(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.resolve_pending(false)
                }
                KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown => {
                    self.handle_scroll(key.code)
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Enter => {
                if self.autocomplete_visible {
                    self.accept_autocomplete();
                } else if self.session.draft().starts_with('/') {
                    let input = std::mem::take(self.session.draft_mut());
                    self.cursor_pos = 0;
                    self.handle_command(&input);
                } else if !self.session.draft().trim().is_empty() {
                    self.submit_draft();
                }
            }
            KeyCode::Tab => {
                if self.autocomplete_visible {
                    self.accept_autocomplete();
                }
            }
            KeyCode::Backspace => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let at = byte_index(self.session.draft(), self.cursor_pos);
                    self.session.draft_mut().remove(at);
                    self.update_autocomplete();
                }
            }
            KeyCode::Delete => {
                if self.cursor_pos < self.session.draft().chars().count() {
                    let at = byte_index(self.session.draft(), self.cursor_pos);
                    self.session.draft_mut().remove(at);
                    self.update_autocomplete();
                }
            }
            KeyCode::Left => {
                self.cursor_pos = self.cursor_pos.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.cursor_pos < self.session.draft().chars().count() {
                    self.cursor_pos += 1;
                }
            }
            KeyCode::Up => {
                if self.autocomplete_visible {
                    self.autocomplete_selected = self.autocomplete_selected.saturating_sub(1);
                } else {
                    self.handle_scroll(KeyCode::Up);
                }
            }
            KeyCode::Down => {
                if self.autocomplete_visible {
                    if self.autocomplete_selected + 1 < self.autocomplete_candidates.len() {
                        self.autocomplete_selected += 1;
                    }
                } else {
                    self.handle_scroll(KeyCode::Down);
                }
            }
            KeyCode::PageUp | KeyCode::PageDown => self.handle_scroll(key.code),
            KeyCode::Home => {
                self.cursor_pos = 0;
            }
            KeyCode::End => {
                self.cursor_pos = self.session.draft().chars().count();
            }
            KeyCode::Esc => {
                if self.autocomplete_visible {
                    self.autocomplete_visible = false;
                    self.autocomplete_candidates.clear();
                } else if self.cmd_output_visible {
                    self.cmd_output_visible = false;
                    self.cmd_output_lines.clear();
                } else {
                    self.session.draft_mut().clear();
                    self.cursor_pos = 0;
                }
            }
            KeyCode::Char(c) => {
                let at = byte_index(self.session.draft(), self.cursor_pos);
                self.session.draft_mut().insert(at, c);
                self.cursor_pos += 1;
                self.update_autocomplete();
            }
            _ => {}
        }
    }

    pub(super) fn handle_paste(&mut self, data: &str) {
        if self.awaiting_approval() {
            return;
        }
        let at = byte_index(self.session.draft(), self.cursor_pos);
        self.session.draft_mut().insert_str(at, data);
        self.cursor_pos += data.chars().count();
        self.update_autocomplete();
    }

    fn handle_scroll(&mut self, code: KeyCode) {
        let step = match code {
            KeyCode::PageUp | KeyCode::PageDown => 10,
            _ => 3,
        };
        match code {
            KeyCode::Up | KeyCode::PageUp => {
                if self.scroll_offset == u16::MAX {
                    // Approximate until the next render clamps it.
                    self.scroll_offset = (self.session.log().len() as u16).saturating_sub(step);
                }
                self.scroll_offset = self.scroll_offset.saturating_sub(step);
            }
            _ => {
                if self.scroll_offset != u16::MAX {
                    self.scroll_offset = self.scroll_offset.saturating_add(step);
                }
            }
        }
    }
}
