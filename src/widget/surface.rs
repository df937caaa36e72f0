//! Page surface: the rendered page drawn with half-block cells, the comment
//! markers on top of it and the composition box.
//!
//! Each terminal cell covers `CELL_WIDTH_PX` x `CELL_HEIGHT_PX` surface
//! pixels, split into an upper and a lower half.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::controller::{Draft, Marker};
use crate::document::PageImage;
use crate::theme::{Base16Palette, night_pixel};

pub const CELL_WIDTH_PX: f64 = 8.0;
pub const CELL_HEIGHT_PX: f64 = 16.0;

const COMPOSE_WIDTH: u16 = 34;
const COMPOSE_HEIGHT: u16 = 6;

/// Scroll offset of the surface, in cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scroll {
    pub x: u16,
    pub y: u16,
}

impl Scroll {
    /// Keeps the offset inside the page for a viewport of `view` cells.
    pub fn clamp_to(&mut self, page: (u16, u16), view: (u16, u16)) {
        self.x = self.x.min(page.0.saturating_sub(view.0));
        self.y = self.y.min(page.1.saturating_sub(view.1));
    }

    /// Scrolls so that page cell `target` is near the middle of the view.
    pub fn center_on(&mut self, target: (u16, u16), page: (u16, u16), view: (u16, u16)) {
        self.x = target.0.saturating_sub(view.0 / 2);
        self.y = target.1.saturating_sub(view.1 / 2);
        self.clamp_to(page, view);
    }
}

/// Page size in cells.
pub fn page_cells(image: &PageImage) -> (u16, u16) {
    let cols = (f64::from(image.width) / CELL_WIDTH_PX).ceil();
    let rows = (f64::from(image.height) / CELL_HEIGHT_PX).ceil();
    (cols.min(f64::from(u16::MAX)) as u16, rows.min(f64::from(u16::MAX)) as u16)
}

/// Surface pixel at the center of page cell `(col, row)`.
pub fn cell_to_surface(col: u16, row: u16) -> (f64, f64) {
    (
        (f64::from(col) + 0.5) * CELL_WIDTH_PX,
        (f64::from(row) + 0.5) * CELL_HEIGHT_PX,
    )
}

/// Page cell containing surface pixel `(x, y)`.
pub fn surface_to_cell(x: f64, y: f64) -> (u16, u16) {
    let col = (x / CELL_WIDTH_PX).floor().clamp(0.0, f64::from(u16::MAX));
    let row = (y / CELL_HEIGHT_PX).floor().clamp(0.0, f64::from(u16::MAX));
    (col as u16, row as u16)
}

fn marker_label(marker: &Marker) -> String {
    marker.number.to_string()
}

/// The marker drawn over page cell `(col, row)`, if any.
pub fn marker_at(markers: &[Marker], col: u16, row: u16) -> Option<&Marker> {
    // Later markers are drawn on top.
    markers.iter().rev().find(|marker| {
        let (mcol, mrow) = surface_to_cell(marker.x, marker.y);
        let width = marker_label(marker).len() as u16;
        mrow == row && col >= mcol && col < mcol.saturating_add(width)
    })
}

pub struct PageSurface<'a> {
    image: Option<&'a PageImage>,
    scroll: Scroll,
    markers: &'a [Marker],
    highlighted: Option<&'a str>,
    draft: Option<&'a Draft>,
    night_mode: bool,
    palette: &'a Base16Palette,
}

impl<'a> PageSurface<'a> {
    pub fn new(image: Option<&'a PageImage>, palette: &'a Base16Palette) -> Self {
        Self {
            image,
            scroll: Scroll::default(),
            markers: &[],
            highlighted: None,
            draft: None,
            night_mode: false,
            palette,
        }
    }

    pub fn scroll(mut self, scroll: Scroll) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn markers(mut self, markers: &'a [Marker], highlighted: Option<&'a str>) -> Self {
        self.markers = markers;
        self.highlighted = highlighted;
        self
    }

    pub fn draft(mut self, draft: Option<&'a Draft>) -> Self {
        self.draft = draft;
        self
    }

    pub fn night_mode(mut self, night_mode: bool) -> Self {
        self.night_mode = night_mode;
        self
    }

    fn block_color(&self, image: &PageImage, x0: u32, y0: u32, w: u32, h: u32) -> Option<Color> {
        if x0 >= image.width || y0 >= image.height {
            return None;
        }
        let x1 = (x0 + w).min(image.width);
        let y1 = (y0 + h).min(image.height);
        let (mut r, mut g, mut b, mut n) = (0u32, 0u32, 0u32, 0u32);
        for y in (y0..y1).step_by(2) {
            for x in (x0..x1).step_by(2) {
                if let Some([pr, pg, pb]) = image.pixel(x, y) {
                    r += u32::from(pr);
                    g += u32::from(pg);
                    b += u32::from(pb);
                    n += 1;
                }
            }
        }
        if n == 0 {
            return None;
        }
        let mut px = [(r / n) as u8, (g / n) as u8, (b / n) as u8];
        if self.night_mode {
            px = night_pixel(px);
        }
        Some(Color::Rgb(px[0], px[1], px[2]))
    }

    fn render_page(&self, image: &PageImage, area: Rect, buf: &mut Buffer) {
        let background = self.palette.base_00;
        let half = (CELL_HEIGHT_PX / 2.0) as u32;
        let cell_w = CELL_WIDTH_PX as u32;
        for dy in 0..area.height {
            for dx in 0..area.width {
                let col = u32::from(dx) + u32::from(self.scroll.x);
                let row = u32::from(dy) + u32::from(self.scroll.y);
                let x0 = col * cell_w;
                let y0 = row * half * 2;
                let top = self.block_color(image, x0, y0, cell_w, half);
                let bottom = self.block_color(image, x0, y0 + half, cell_w, half);
                if let Some(cell) = buf.cell_mut((area.x + dx, area.y + dy)) {
                    cell.set_symbol("▀")
                        .set_fg(top.unwrap_or(background))
                        .set_bg(bottom.unwrap_or(background));
                }
            }
        }
    }

    fn render_markers(&self, area: Rect, buf: &mut Buffer) {
        for marker in self.markers {
            let (col, row) = surface_to_cell(marker.x, marker.y);
            if col < self.scroll.x || row < self.scroll.y {
                continue;
            }
            let x = area.x.saturating_add(col - self.scroll.x);
            let y = area.y.saturating_add(row - self.scroll.y);
            if x >= area.right() || y >= area.bottom() {
                continue;
            }
            let style = if self.highlighted == Some(marker.id.as_str()) {
                Style::default()
                    .fg(self.palette.base_07)
                    .bg(self.palette.base_08)
                    .add_modifier(Modifier::BOLD)
            } else if marker.resolved {
                Style::default().fg(self.palette.base_00).bg(self.palette.base_03)
            } else {
                Style::default()
                    .fg(Color::Black)
                    .bg(self.palette.base_0a)
                    .add_modifier(Modifier::BOLD)
            };
            let label = marker_label(marker);
            let width = (label.len() as u16).min(area.right() - x);
            buf.set_stringn(x, y, &label, width as usize, style);
        }
    }

    fn render_draft(&self, draft: &Draft, area: Rect, buf: &mut Buffer) {
        let (col, row) = surface_to_cell(draft.point.0, draft.point.1);
        let rel_x = col.saturating_sub(self.scroll.x);
        let rel_y = row.saturating_sub(self.scroll.y).saturating_add(1);
        let width = COMPOSE_WIDTH.min(area.width);
        let height = COMPOSE_HEIGHT.min(area.height);
        let x = area.x + rel_x.min(area.width.saturating_sub(width));
        let y = area.y + rel_y.min(area.height.saturating_sub(height));
        let rect = Rect::new(x, y, width, height);

        let lines: Vec<Line> = draft
            .text
            .split('\n')
            .map(|line| Line::from(line.to_string()))
            .collect();
        Clear.render(rect, buf);
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Comment ")
                    .title_bottom(" Enter save · Esc cancel ")
                    .border_style(Style::default().fg(self.palette.base_0a))
                    .style(Style::default().bg(self.palette.base_01)),
            )
            .style(Style::default().fg(self.palette.base_06))
            .wrap(Wrap { trim: false })
            .render(rect, buf);
    }
}

impl Widget for PageSurface<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let Some(image) = self.image else {
            buf.set_style(area, Style::default().bg(self.palette.base_00));
            return;
        };
        self.render_page(image, area, buf);
        self.render_markers(area, buf);
        if let Some(draft) = self.draft {
            self.render_draft(draft, area, buf);
        }
    }
}
