use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::{COMMANDS, ChatInterface, CommandInfo};
use crate::core::session::{ConnectionState, EventKind, NoticeLevel};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

impl ChatInterface {
    pub(super) fn render_messages(&self, area: Rect) -> Paragraph<'_> {
        let mut lines: Vec<Line> = Vec::new();

        for event in self.session.log().since(self.display_from) {
            match &event.kind {
                EventKind::UserQuestion => {
                    lines.push(Line::from(vec![
                        Span::styled("  > ", Style::default().fg(Color::Cyan)),
                        Span::styled(event.content.as_str(), Style::default().fg(Color::White)),
                    ]));
                }
                EventKind::GeneratedQuery { warnings, .. } => {
                    lines.push(Line::from(Span::styled(
                        "  Proposed query:",
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::BOLD),
                    )));
                    for text_line in event.content.lines() {
                        lines.push(Line::from(vec![
                            Span::raw("    "),
                            Span::styled(text_line, Style::default().fg(Color::Yellow)),
                        ]));
                    }
                    for warning in warnings {
                        lines.push(Line::from(Span::styled(
                            format!("  ⚠ This query {}", warning),
                            Style::default().fg(Color::Red),
                        )));
                    }
                }
                EventKind::ExecutionResult { .. } => {
                    lines.push(Line::from(Span::styled(
                        "  Result:",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )));
                    for text_line in event.content.lines() {
                        lines.push(Line::from(vec![
                            Span::raw("    "),
                            Span::styled(text_line, Style::default().fg(Color::Gray)),
                        ]));
                    }
                }
                EventKind::SystemNotice { level } => {
                    let content_style = match level {
                        NoticeLevel::Info => Style::default().fg(Color::Green),
                        NoticeLevel::Warning => Style::default().fg(Color::Yellow),
                        NoticeLevel::Error => Style::default().fg(Color::Red),
                    };
                    for text_line in event.content.lines() {
                        let mut spans = vec![Span::raw("  ")];
                        spans.extend(parse_inline_markdown(text_line, content_style));
                        lines.push(Line::from(spans));
                    }
                }
            }
            lines.push(Line::from(""));
        }

        let activity = if self.session.is_busy() {
            Some(self.busy_label)
        } else if self.session.connection() == ConnectionState::Checking {
            Some("Checking backend...")
        } else {
            None
        };
        if let Some(label) = activity {
            let frame = SPINNER[self.spinner_tick % SPINNER.len()];
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("{} {}", frame, label),
                    Style::default().fg(Color::Yellow),
                ),
            ]));
        }

        let total_lines = lines.len() as u16;
        let visible_height = area.height.saturating_sub(2);
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = if self.scroll_offset == u16::MAX {
            max_scroll
        } else {
            self.scroll_offset.min(max_scroll)
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .title(self.title_line())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
    }

    fn title_line(&self) -> Line<'_> {
        let (badge, color) = match self.session.connection() {
            ConnectionState::Checking => ("● checking", Color::Yellow),
            ConnectionState::Connected => ("● connected", Color::Green),
            ConnectionState::Error => ("● offline", Color::Red),
        };
        Line::from(vec![
            Span::styled(
                " mongo-chat ",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{} ", self.backend.endpoint()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(badge, Style::default().fg(color)),
            Span::raw(" "),
        ])
    }

    /// Warnings attached to the proposal currently awaiting approval.
    fn pending_warnings(&self) -> &[String] {
        let Some(pending) = self.session.pending() else {
            return &[];
        };
        self.session
            .log()
            .iter()
            .rev()
            .find_map(|event| match &event.kind {
                EventKind::GeneratedQuery {
                    query, warnings, ..
                } if *query == pending.query => Some(warnings.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub(super) fn approval_height(&self) -> u16 {
        3 + self.pending_warnings().len() as u16
    }

    pub(super) fn render_approval(&self) -> Paragraph<'_> {
        let warnings = self.pending_warnings();
        let mut lines = vec![Line::from(vec![
            Span::styled("  Run this query against the database?  ", Style::default()),
            Span::styled(
                "[y]",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" approve  "),
            Span::styled(
                "[n]",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" cancel"),
        ])];
        for warning in warnings {
            lines.push(Line::from(Span::styled(
                format!("  ⚠ This query {}", warning),
                Style::default().fg(Color::Red),
            )));
        }

        let border = if warnings.is_empty() {
            Color::Yellow
        } else {
            Color::Red
        };
        Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Approve query? ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
            .wrap(Wrap { trim: false })
    }

    pub(super) fn render_cmd_output(&self) -> Paragraph<'_> {
        let lines: Vec<Line> = self
            .cmd_output_lines
            .iter()
            .map(|l| {
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(l.as_str(), Style::default().fg(Color::Cyan)),
                ])
            })
            .collect();

        Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Command Output (Esc to dismiss) ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Magenta)),
            )
            .wrap(Wrap { trim: false })
    }

    pub(super) fn render_autocomplete(&self, input_area: Rect) -> (Paragraph<'_>, Rect) {
        let popup_height = self.autocomplete_candidates.len() as u16 + 2;
        let popup_width = 48;

        let popup_area = Rect {
            x: input_area.x + 1,
            y: input_area.y.saturating_sub(popup_height),
            width: popup_width.min(input_area.width.saturating_sub(2)),
            height: popup_height,
        };

        let lines: Vec<Line> = self
            .autocomplete_candidates
            .iter()
            .enumerate()
            .map(|(i, &cmd_idx)| {
                let cmd: &CommandInfo = &COMMANDS[cmd_idx];
                let is_selected = i == self.autocomplete_selected;
                let style = if is_selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                let desc_style = if is_selected {
                    Style::default().fg(Color::DarkGray).bg(Color::Cyan)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Line::from(vec![
                    Span::styled(format!(" {:<13}", cmd.name), style),
                    Span::styled(format!(" {}", cmd.description), desc_style),
                ])
            })
            .collect();

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

        (widget, popup_area)
    }
}

/// Inline `**bold**` and `` `code` ``, whichever opens first. An unclosed
/// delimiter is kept as plain text.
pub(super) fn parse_inline_markdown<'a>(text: &'a str, base_style: Style) -> Vec<Span<'a>> {
    let mut spans = Vec::new();
    let mut rest = text;

    loop {
        let bold = rest.find("**").map(|pos| (pos, "**"));
        let code = rest.find('`').map(|pos| (pos, "`"));
        let next = match (bold, code) {
            (Some(b), Some(c)) => Some(if c.0 < b.0 { c } else { b }),
            (b, c) => b.or(c),
        };

        let Some((start, delim)) = next else {
            if !rest.is_empty() {
                spans.push(Span::styled(rest, base_style));
            }
            break;
        };
        let inner = &rest[start + delim.len()..];
        let Some(end) = inner.find(delim) else {
            spans.push(Span::styled(rest, base_style));
            break;
        };

        if start > 0 {
            spans.push(Span::styled(&rest[..start], base_style));
        }
        let style = if delim == "**" {
            base_style.add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        spans.push(Span::styled(&inner[..end], style));
        rest = &inner[end + delim.len()..];
    }

    if spans.is_empty() {
        spans.push(Span::styled("", base_style));
    }
    spans
}
