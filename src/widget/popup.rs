use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::api::ObjectInfo;
use crate::controller::CommentAction;
use crate::date::format_relative_date;
use crate::theme::Base16Palette;

/// Modal overlays; while one is open it receives every key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Popup {
    /// Asks before running a comment action
    Confirm {
        message: String,
        action: CommentAction,
    },
    /// Blocking error report, dismissed with Enter or Esc
    Alert(String),
    /// Object information panel
    Info,
}

/// A `width` x `height` rectangle centered in `area`, clipped to it.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

pub fn render_confirm(f: &mut Frame, area: Rect, message: &str, palette: &Base16Palette) {
    let popup_area = centered_rect(48, 6, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(palette.base_06))),
        Line::default(),
        Line::from(vec![
            Span::styled("[y] ", Style::default().fg(palette.base_0b).add_modifier(Modifier::BOLD)),
            Span::styled("Yes   ", Style::default().fg(palette.base_05)),
            Span::styled("[n] ", Style::default().fg(palette.base_08).add_modifier(Modifier::BOLD)),
            Span::styled("No", Style::default().fg(palette.base_05)),
        ]),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Confirm ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0a))
                .style(Style::default().bg(palette.base_00)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

pub fn render_alert(f: &mut Frame, area: Rect, message: &str, palette: &Base16Palette) {
    let popup_area = centered_rect(56, 7, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(palette.base_07))),
        Line::default(),
        Line::from(Span::styled("Press Enter to close", Style::default().fg(palette.base_03))),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Error ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_08))
                .style(Style::default().bg(palette.base_00)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

pub fn render_info(
    f: &mut Frame,
    area: Rect,
    object: Option<&ObjectInfo>,
    can_edit: bool,
    palette: &Base16Palette,
) {
    let popup_area = centered_rect(60, 12, area);
    f.render_widget(Clear, popup_area);

    let label = Style::default().fg(palette.base_03);
    let value = Style::default().fg(palette.base_06);
    let field = |name: &'static str, text: String| {
        Line::from(vec![
            Span::styled(format!("{name:<13}"), label),
            Span::styled(text, value),
        ])
    };

    let lines = match object {
        None => vec![Line::from(Span::styled("Object information unavailable", label))],
        Some(object) => {
            let status = object.status.map(|s| {
                Span::styled(
                    s.as_str(),
                    Style::default()
                        .fg(palette.status_color(s))
                        .add_modifier(Modifier::BOLD),
                )
            });
            let mut lines = vec![
                field("Name", object.name.clone()),
                field("Description", object.description.clone().unwrap_or_default()),
                field("Version", object.version.clone().unwrap_or_default()),
                Line::from(vec![
                    Span::styled(format!("{:<13}", "Status"), label),
                    status.unwrap_or_else(|| Span::styled("-", value)),
                ]),
                field(
                    "Updated",
                    object
                        .update_date
                        .as_deref()
                        .map(format_relative_date)
                        .unwrap_or_default(),
                ),
            ];
            if let Some(path) = &object.path {
                lines.push(field("Path", path.clone()));
            }
            lines.push(Line::default());
            let hint = if can_edit {
                "[s] next status  [Esc] close"
            } else {
                "[Esc] close"
            };
            lines.push(Line::from(Span::styled(hint, label)));
            lines
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Information ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0c))
                .style(Style::default().bg(palette.base_00)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup_area);
}
