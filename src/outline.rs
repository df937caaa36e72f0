use crate::document::{Destination, DocumentEngine, EngineError, OutlineItem};
use crate::theme::Base16Palette;
use log::warn;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const NO_OUTLINE_MESSAGE: &str = "No outline available";

/// Outline entry with its disclosure state. Nested entries start collapsed.
#[derive(Clone, Debug, PartialEq)]
pub struct OutlineNode {
    pub title: String,
    pub destination: Option<Destination>,
    pub children: Vec<OutlineNode>,
    pub is_expanded: bool,
}

impl From<OutlineItem> for OutlineNode {
    fn from(item: OutlineItem) -> Self {
        Self {
            title: item.title,
            destination: item.destination,
            children: item.children.into_iter().map(OutlineNode::from).collect(),
            is_expanded: false,
        }
    }
}

impl OutlineNode {
    fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// `+` when collapsed, `−` when expanded, nothing for leaves
    pub fn toggle_indicator(&self) -> &'static str {
        match (self.has_children(), self.is_expanded) {
            (false, _) => " ",
            (true, false) => "+",
            (true, true) => "−",
        }
    }
}

pub struct OutlineNavigator {
    nodes: Vec<OutlineNode>,
    pub selected_index: usize,
    pub list_state: ListState,
}

impl OutlineNavigator {
    pub fn new(items: Vec<OutlineItem>) -> Self {
        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            nodes: items.into_iter().map(OutlineNode::from).collect(),
            selected_index: 0,
            list_state,
        }
    }

    /// Builds the navigator from the engine's outline; a failing outline
    /// read is treated as no outline.
    pub fn from_engine(engine: &dyn DocumentEngine) -> Self {
        match engine.outline() {
            Ok(items) => Self::new(items),
            Err(e) => {
                warn!("Failed to read document outline: {e}");
                Self::new(Vec::new())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[OutlineNode] {
        &self.nodes
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < count_visible(&self.nodes) {
            self.selected_index += 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn selected(&self) -> Option<&OutlineNode> {
        node_by_index(&self.nodes, self.selected_index, &mut 0)
    }

    /// Expands or collapses the selected entry. Returns false for leaves.
    pub fn toggle_selected(&mut self) -> bool {
        match node_by_index_mut(&mut self.nodes, self.selected_index, &mut 0) {
            Some(node) if node.has_children() => {
                node.is_expanded = !node.is_expanded;
                true
            }
            _ => false,
        }
    }

    /// Resolves the selected entry to a 1-based page number.
    ///
    /// Entries without a destination resolve to `None`.
    pub fn activate(&self, engine: &dyn DocumentEngine) -> Result<Option<u32>, EngineError> {
        let Some(destination) = self.selected().and_then(|n| n.destination.as_ref()) else {
            return Ok(None);
        };
        let index = engine.page_index(destination)?;
        Ok(Some(index as u32 + 1))
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, is_focused: bool, palette: &Base16Palette) {
        let (text_color, border_color, bg_color) = palette.get_panel_colors(is_focused);
        let (selection_bg, selection_fg) = palette.get_selection_colors(is_focused);

        let mut items: Vec<ListItem> = Vec::new();
        if self.nodes.is_empty() {
            items.push(ListItem::new(Line::from(Span::styled(
                NO_OUTLINE_MESSAGE,
                Style::default().fg(palette.base_03),
            ))));
        } else {
            let width = area.width.saturating_sub(2) as usize;
            push_items(&self.nodes, 0, width, &mut items, text_color, palette);
        }

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Outline")
                    .border_style(Style::default().fg(border_color))
                    .style(Style::default().bg(bg_color)),
            )
            .highlight_style(Style::default().bg(selection_bg).fg(selection_fg));

        f.render_stateful_widget(list, area, &mut self.list_state);
    }
}

fn push_items(
    nodes: &[OutlineNode],
    depth: usize,
    width: usize,
    items: &mut Vec<ListItem<'static>>,
    text_color: ratatui::style::Color,
    palette: &Base16Palette,
) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        let style = if node.destination.is_some() {
            Style::default().fg(text_color)
        } else {
            Style::default().fg(palette.base_03)
        };
        let prefix = format!("{indent}{} ", node.toggle_indicator());
        let title = truncate_to_width(&node.title, width.saturating_sub(prefix.width()));
        items.push(ListItem::new(Line::from(vec![
            Span::styled(prefix, Style::default().fg(palette.base_0d)),
            Span::styled(title, style),
        ])));
        if node.is_expanded {
            push_items(&node.children, depth + 1, width, items, text_color, palette);
        }
    }
}

/// Cuts `text` to at most `width` columns, marking the cut with an ellipsis.
fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    if width > 0 {
        out.push('…');
    }
    out
}

/// Count visible entries (considering expansion state)
fn count_visible(nodes: &[OutlineNode]) -> usize {
    nodes
        .iter()
        .map(|node| {
            1 + if node.is_expanded {
                count_visible(&node.children)
            } else {
                0
            }
        })
        .sum()
}

fn node_by_index<'a>(
    nodes: &'a [OutlineNode],
    target: usize,
    current: &mut usize,
) -> Option<&'a OutlineNode> {
    for node in nodes {
        if *current == target {
            return Some(node);
        }
        *current += 1;
        if node.is_expanded {
            if let Some(found) = node_by_index(&node.children, target, current) {
                return Some(found);
            }
        }
    }
    None
}

fn node_by_index_mut<'a>(
    nodes: &'a mut [OutlineNode],
    target: usize,
    current: &mut usize,
) -> Option<&'a mut OutlineNode> {
    for node in nodes {
        if *current == target {
            return Some(node);
        }
        *current += 1;
        if node.is_expanded {
            if let Some(found) = node_by_index_mut(&mut node.children, target, current) {
                return Some(found);
            }
        }
    }
    None
}
