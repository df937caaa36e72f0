use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::controller::{CommentView, EMPTY_MESSAGE, SidebarContent, SidebarRow};
use crate::theme::Base16Palette;
use crate::view::DisplayMode;

pub struct SidebarProps<'a> {
    pub view: &'a CommentView,
    pub mode: DisplayMode,
    pub highlighted: Option<&'a str>,
    pub is_focused: bool,
}

pub fn render_sidebar(
    f: &mut Frame,
    area: Rect,
    props: &SidebarProps<'_>,
    list_state: &mut ListState,
    palette: &Base16Palette,
) {
    let (text_color, border_color, bg_color) = palette.get_panel_colors(props.is_focused);
    let title = format!(" Comments ({}) · {} ", props.view.count(), props.mode.label());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(bg_color));

    let rows = match &props.view.sidebar {
        SidebarContent::Rows(rows) => rows,
        SidebarContent::Loading => {
            let loading = Paragraph::new(Span::styled("Loading…", Style::default().fg(palette.base_03)));
            f.render_widget(loading.block(block), area);
            return;
        }
        SidebarContent::Error(message) => {
            let error = Paragraph::new(Span::styled(message.as_str(), Style::default().fg(palette.base_08)))
                .wrap(Wrap { trim: true });
            f.render_widget(error.block(block), area);
            return;
        }
        SidebarContent::Empty => {
            let empty = Paragraph::new(Span::styled(EMPTY_MESSAGE, Style::default().fg(palette.base_03)));
            f.render_widget(empty.block(block), area);
            return;
        }
    };

    let width = area.width.saturating_sub(4).max(8) as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| row_item(row, props, width, text_color, palette))
        .collect();

    let (selection_bg, selection_fg) = palette.get_selection_colors(props.is_focused);
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(selection_bg).fg(selection_fg));
    f.render_stateful_widget(list, area, list_state);
}

fn row_item(
    row: &SidebarRow,
    props: &SidebarProps<'_>,
    width: usize,
    text_color: ratatui::style::Color,
    palette: &Base16Palette,
) -> ListItem<'static> {
    let highlighted = props.highlighted == Some(row.id.as_str());
    let mut text_style = Style::default().fg(text_color);
    if row.resolved {
        text_style = text_style.fg(palette.base_03).add_modifier(Modifier::CROSSED_OUT);
    }

    let mut header = vec![
        Span::styled(format!("({}) ", row.number), Style::default().fg(palette.base_0a)),
        Span::styled(
            format!("{}:", row.author_name),
            Style::default().fg(palette.base_0d).add_modifier(Modifier::BOLD),
        ),
    ];
    if props.mode == DisplayMode::All {
        header.push(Span::styled(
            format!(" p.{}", row.page),
            Style::default().fg(palette.base_03),
        ));
    }
    if row.resolved {
        header.push(Span::styled(" ✓", Style::default().fg(palette.base_0b)));
    }

    let mut lines = vec![Line::from(header)];
    for line in row.text.split('\n') {
        for wrapped in textwrap::wrap(line, width) {
            lines.push(Line::from(Span::styled(format!("  {wrapped}"), text_style)));
        }
    }

    let controls = if row.editable {
        if row.resolved {
            "  [g] locate  [r] undo  [d] delete"
        } else {
            "  [g] locate  [r] resolve  [d] delete"
        }
    } else {
        "  [g] locate"
    };
    lines.push(Line::from(Span::styled(controls, Style::default().fg(palette.base_03))));

    let item = ListItem::new(lines);
    if highlighted {
        item.style(Style::default().bg(palette.base_0a).fg(palette.base_00))
    } else {
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{ThemeId, palette};
    use ratatui::{Terminal, backend::TestBackend};

    fn row(number: usize, text: &str, editable: bool) -> SidebarRow {
        SidebarRow {
            id: format!("c{number}"),
            number,
            page: 2,
            author_name: "Ada".to_string(),
            text: text.to_string(),
            resolved: false,
            editable,
        }
    }

    fn draw(view: &CommentView, mode: DisplayMode) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        let mut state = ListState::default();
        terminal
            .draw(|f| {
                let props = SidebarProps {
                    view,
                    mode,
                    highlighted: None,
                    is_focused: true,
                };
                let area = f.area();
                render_sidebar(f, area, &props, &mut state, palette(ThemeId::Dark));
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn shows_count_and_rows() {
        let view = CommentView {
            markers: Vec::new(),
            sidebar: SidebarContent::Rows(vec![row(1, "first", true), row(2, "second", false)]),
        };
        let screen = draw(&view, DisplayMode::All);
        assert!(screen.contains("Comments (2)"));
        assert!(screen.contains("(1) Ada: p.2"));
        assert!(screen.contains("[r] resolve"));
        assert!(screen.contains("second"));
    }

    #[test]
    fn shows_placeholder_when_empty() {
        let view = CommentView {
            markers: Vec::new(),
            sidebar: SidebarContent::Empty,
        };
        let screen = draw(&view, DisplayMode::PerPage);
        assert!(screen.contains("No comments on this page."));
        assert!(screen.contains("Comments (0) · This page"));
    }
}
