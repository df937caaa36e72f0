//! Terminal application: event routing, page rendering and drawing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, error, info, warn};
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListState, Paragraph},
};

use crate::api::ObjectApi;
use crate::controller::{CommentAction, CommentController, ComposeKey, ComposeOutcome};
use crate::document::{DocumentEngine, PageCache, PageImage};
use crate::event_source::{
    Event, EventSource, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use crate::notification::{NotificationLevel, NotificationManager};
use crate::outline::OutlineNavigator;
use crate::settings;
use crate::theme::{self, Base16Palette};
use crate::view::{Command, Effect};
use crate::widget::popup::{self, Popup};
use crate::widget::sidebar::{SidebarProps, render_sidebar};
use crate::widget::surface::{self, PageSurface, Scroll};

const SIDEBAR_WIDTH: u16 = 42;
const OUTLINE_WIDTH: u16 = 30;
const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Surface,
    Sidebar,
    Outline,
}

pub struct App<A> {
    engine: Box<dyn DocumentEngine>,
    cache: PageCache,
    pub controller: CommentController<A>,
    outline: OutlineNavigator,
    show_outline: bool,
    focus: Focus,
    popup: Option<Popup>,
    sidebar_state: ListState,
    scroll: Scroll,
    page_image: Option<Arc<PageImage>>,
    render_error: Option<String>,
    notifications: NotificationManager,
    surface_area: Rect,
    should_quit: bool,
}

impl<A: ObjectApi> App<A> {
    pub fn new(engine: Box<dyn DocumentEngine>, mut controller: CommentController<A>) -> Self {
        let page_count = engine.page_count() as u32;
        // Only clamps the page here; start() renders it and loads comments.
        let _ = controller.apply(Command::SetPageCount(page_count));
        let outline = OutlineNavigator::from_engine(engine.as_ref());

        Self {
            engine,
            cache: PageCache::default(),
            controller,
            outline,
            show_outline: false,
            focus: Focus::Surface,
            popup: None,
            sidebar_state: ListState::default(),
            scroll: Scroll::default(),
            page_image: None,
            render_error: None,
            notifications: NotificationManager::new(),
            surface_area: Rect::default(),
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn scroll(&self) -> Scroll {
        self.scroll
    }

    /// Loads object metadata, paints the first page and its comments.
    pub async fn start(&mut self) {
        if let Err(e) = self.controller.load_object().await {
            warn!("Failed to load object information: {e}");
            self.notifications
                .notify(format!("Object information unavailable: {e}"), NotificationLevel::Warning);
        }
        let page = self.controller.view.page;
        self.run_effects(vec![Effect::RenderPage(page), Effect::ReloadComments])
            .await;
    }

    /// Runs effects in order; a page render always precedes the reload
    /// that follows it.
    pub async fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RenderPage(page) => self.render_page(page),
                Effect::ReloadComments => self.controller.load_comments().await,
                Effect::PersistNightMode(enabled) => settings::set_night_mode(enabled),
            }
        }
    }

    fn render_page(&mut self, page: u32) {
        let scale = self.controller.view.scale();
        let engine = &self.engine;
        match self
            .cache
            .get_or_render(page, scale, || engine.render_page(page, scale))
        {
            Ok(image) => {
                debug!("Page {page} at {scale:.2}: {}x{}", image.width, image.height);
                self.page_image = Some(image);
                self.render_error = None;
            }
            Err(e) => {
                error!("Failed to render page {page}: {e}");
                self.page_image = None;
                self.render_error = Some(format!("Failed to render page {page}: {e}"));
            }
        }
    }

    async fn apply(&mut self, cmd: Command) {
        let before = self.controller.view.page;
        let effects = self.controller.apply(cmd);
        if self.controller.view.page != before {
            self.scroll = Scroll::default();
        }
        self.run_effects(effects).await;
    }

    /// Housekeeping between events. Returns true when a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let expired = self.controller.expire_highlight(now);
        let dropped = self.notifications.update();
        expired || dropped
    }

    pub async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key(key).await;
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.handle_click(mouse.column, mouse.row);
            }
            _ => {}
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if self.popup.is_some() {
            self.handle_popup_key(key).await;
            return;
        }
        if self.controller.compose.is_composing() {
            self.handle_compose_key(key).await;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::Left => self.apply(Command::PrevPage).await,
            KeyCode::Right => self.apply(Command::NextPage).await,
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(Command::ZoomIn).await,
            KeyCode::Char('-') => self.zoom(Command::ZoomOut).await,
            KeyCode::Char('0') => self.zoom(Command::ResetZoom).await,
            KeyCode::Char('m') => self.apply(Command::ToggleMode).await,
            KeyCode::Char('n') => self.apply(Command::ToggleNightMode).await,
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('o') => self.toggle_outline(),
            KeyCode::Char('i') => self.popup = Some(Popup::Info),
            KeyCode::Char('s') => self.cycle_status().await,
            KeyCode::Char('c') => self.compose_at_center(),
            _ => match self.focus {
                Focus::Surface => self.handle_surface_key(key),
                Focus::Sidebar => self.handle_sidebar_key(key).await,
                Focus::Outline => self.handle_outline_key(key).await,
            },
        }
    }

    async fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(current) = self.popup.take() else {
            return;
        };
        match current {
            Popup::Confirm { message, action } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.perform(action).await,
                KeyCode::Char('n') | KeyCode::Esc => {}
                _ => self.popup = Some(Popup::Confirm { message, action }),
            },
            Popup::Alert(message) => match key.code {
                KeyCode::Enter | KeyCode::Esc => {}
                _ => self.popup = Some(Popup::Alert(message)),
            },
            Popup::Info => match key.code {
                KeyCode::Esc | KeyCode::Char('i') | KeyCode::Char('q') => {}
                KeyCode::Char('s') => {
                    self.popup = Some(Popup::Info);
                    self.cycle_status().await;
                }
                _ => self.popup = Some(Popup::Info),
            },
        }
    }

    async fn handle_compose_key(&mut self, key: KeyEvent) {
        let compose_key = match key.code {
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                ComposeKey::Newline
            }
            KeyCode::Enter => ComposeKey::Enter,
            KeyCode::Esc => ComposeKey::Escape,
            KeyCode::Backspace => ComposeKey::Backspace,
            KeyCode::Char(c) => ComposeKey::Char(c),
            _ => return,
        };
        match self.controller.compose_key(compose_key).await {
            Ok(ComposeOutcome::Submit(_)) => self.notifications.info("Comment saved"),
            Ok(_) => {}
            Err(e) => self.alert(CommentAction::Create.failure_message(&e)),
        }
    }

    fn handle_surface_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(0, 1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(0, -1),
            KeyCode::PageDown => self.scroll_by(0, self.surface_area.height as i32 / 2),
            KeyCode::PageUp => self.scroll_by(0, -(self.surface_area.height as i32 / 2)),
            KeyCode::Char('L') => self.scroll_by(4, 0),
            KeyCode::Char('H') => self.scroll_by(-4, 0),
            _ => {}
        }
    }

    async fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let count = self.controller.comments().count();
        let selected = self.sidebar_state.selected();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                let next = selected.map_or(0, |i| (i + 1).min(count - 1));
                self.sidebar_state.select(Some(next));
            }
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                let prev = selected.map_or(0, |i| i.saturating_sub(1));
                self.sidebar_state.select(Some(prev));
            }
            KeyCode::Enter | KeyCode::Char('g') => {
                if let Some(id) = self.selected_comment_id() {
                    self.locate(&id).await;
                }
            }
            KeyCode::Char('r') => {
                if let Some(action) = self
                    .selected_comment_id()
                    .and_then(|id| self.controller.resolve_action(&id))
                {
                    self.request(action).await;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_comment_id() {
                    self.request(CommentAction::Delete(id)).await;
                }
            }
            _ => {}
        }
    }

    async fn handle_outline_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.outline.move_selection_down(),
            KeyCode::Up | KeyCode::Char('k') => self.outline.move_selection_up(),
            KeyCode::Char(' ') => {
                self.outline.toggle_selected();
            }
            KeyCode::Enter => match self.outline.activate(self.engine.as_ref()) {
                Ok(Some(page)) => self.apply(Command::GoToPage(page)).await,
                Ok(None) => {
                    self.outline.toggle_selected();
                }
                Err(e) => {
                    warn!("Outline entry cannot be opened: {e}");
                    self.notifications.warn(e.to_string());
                }
            },
            KeyCode::Esc => self.toggle_outline(),
            _ => {}
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        if self.popup.is_some() {
            return;
        }
        let area = self.surface_area;
        if !area.contains(Position::new(column, row)) {
            return;
        }
        let Some(image) = self.page_image.clone() else {
            return;
        };
        let col = column - area.x + self.scroll.x;
        let row = row - area.y + self.scroll.y;

        let hit = surface::marker_at(&self.controller.comments().markers, col, row)
            .map(|marker| marker.id.clone());
        if let Some(id) = hit {
            if let Some(index) = self.controller.focus_from_marker(&id, Instant::now()) {
                self.sidebar_state.select(Some(index));
            }
            return;
        }

        let (page_cols, page_rows) = surface::page_cells(&image);
        if col >= page_cols || row >= page_rows {
            return;
        }
        if !self.controller.begin_compose(surface::cell_to_surface(col, row)) {
            self.notifications.warn("Commenting is disabled for this document");
        }
    }

    fn compose_at_center(&mut self) {
        let Some(image) = self.page_image.as_ref() else {
            return;
        };
        let (page_cols, page_rows) = surface::page_cells(image);
        let col = (self.scroll.x + self.surface_area.width / 2).min(page_cols.saturating_sub(1));
        let row = (self.scroll.y + self.surface_area.height / 2).min(page_rows.saturating_sub(1));
        if !self.controller.begin_compose(surface::cell_to_surface(col, row)) {
            self.notifications.warn("Commenting is disabled for this document");
        }
    }

    fn selected_comment_id(&self) -> Option<String> {
        let index = self.sidebar_state.selected()?;
        self.controller
            .comments()
            .sidebar
            .rows()
            .get(index)
            .map(|row| row.id.clone())
    }

    async fn request(&mut self, action: CommentAction) {
        if !self.controller.session().can_comment {
            self.notifications.warn("Commenting is disabled for this document");
            return;
        }
        match self.controller.confirmation_for(&action) {
            Some(message) => {
                self.popup = Some(Popup::Confirm {
                    message: message.to_string(),
                    action,
                });
            }
            None => self.perform(action).await,
        }
    }

    async fn perform(&mut self, action: CommentAction) {
        if let Err(e) = self.controller.perform(&action).await {
            self.alert(action.failure_message(&e));
        }
        let count = self.controller.comments().count();
        if let Some(selected) = self.sidebar_state.selected() {
            self.sidebar_state
                .select((count > 0).then(|| selected.min(count - 1)));
        }
    }

    async fn locate(&mut self, id: &str) {
        let effects = self.controller.locate(id, Instant::now());
        if !effects.is_empty() {
            self.scroll = Scroll::default();
        }
        self.run_effects(effects).await;
        self.scroll_to_marker(id);
        if let Some(index) = self.controller.comments().row_index(id) {
            self.sidebar_state.select(Some(index));
        }
    }

    fn scroll_to_marker(&mut self, id: &str) {
        let Some(image) = self.page_image.as_ref() else {
            return;
        };
        let Some(marker) = self
            .controller
            .comments()
            .markers
            .iter()
            .find(|m| m.id == id)
        else {
            return;
        };
        let target = surface::surface_to_cell(marker.x, marker.y);
        let view = (self.surface_area.width, self.surface_area.height);
        self.scroll
            .center_on(target, surface::page_cells(image), view);
    }

    async fn zoom(&mut self, cmd: Command) {
        self.apply(cmd).await;
        let zoom = self.controller.view.zoom;
        self.notifications.info(format!("Zoom {}%", zoom.percent()));
    }

    async fn cycle_status(&mut self) {
        if !self.controller.session().can_edit {
            self.notifications.warn("Status changes are disabled for this document");
            return;
        }
        match self.controller.cycle_status().await {
            Ok(Some(status)) => self.notifications.info(format!("Status: {status}")),
            Ok(None) => {}
            Err(e) => self.alert(e.to_string()),
        }
    }

    fn toggle_theme(&mut self) {
        let next = theme::current_theme_id().toggled();
        let applied = theme::change_theme(next.as_setting(), true);
        info!("Theme switched to {}", applied.as_setting());
    }

    fn toggle_outline(&mut self) {
        self.show_outline = !self.show_outline;
        self.focus = if self.show_outline {
            Focus::Outline
        } else {
            Focus::Surface
        };
    }

    fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Surface => Focus::Sidebar,
            Focus::Sidebar if self.show_outline => Focus::Outline,
            Focus::Sidebar | Focus::Outline => Focus::Surface,
        };
        if self.focus == Focus::Sidebar && self.sidebar_state.selected().is_none() {
            let has_rows = self.controller.comments().count() > 0;
            self.sidebar_state.select(has_rows.then_some(0));
        }
    }

    fn alert(&mut self, message: String) {
        error!("{message}");
        self.popup = Some(Popup::Alert(message));
    }

    fn scroll_by(&mut self, dx: i32, dy: i32) {
        let Some(image) = self.page_image.as_ref() else {
            return;
        };
        let x = (i32::from(self.scroll.x) + dx).max(0) as u16;
        let y = (i32::from(self.scroll.y) + dy).max(0) as u16;
        self.scroll = Scroll { x, y };
        let view = (self.surface_area.width, self.surface_area.height);
        self.scroll.clamp_to(surface::page_cells(image), view);
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = theme::current_theme();
        let [top, main, bottom] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(f.area());

        self.draw_top_bar(f, top, palette);

        let outline_width = if self.show_outline { OUTLINE_WIDTH } else { 0 };
        let [outline_area, surface_area, sidebar_area] = Layout::horizontal([
            Constraint::Length(outline_width),
            Constraint::Min(10),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .areas(main);

        if self.show_outline {
            self.outline
                .render(f, outline_area, self.focus == Focus::Outline, palette);
        }
        self.draw_surface(f, surface_area, palette);

        let now = Instant::now();
        let props = SidebarProps {
            view: self.controller.comments(),
            mode: self.controller.view.mode,
            highlighted: self.controller.highlighted(now),
            is_focused: self.focus == Focus::Sidebar,
        };
        render_sidebar(f, sidebar_area, &props, &mut self.sidebar_state, palette);

        self.draw_status_bar(f, bottom, palette);

        let screen = f.area();
        match &self.popup {
            Some(Popup::Confirm { message, .. }) => popup::render_confirm(f, screen, message, palette),
            Some(Popup::Alert(message)) => popup::render_alert(f, screen, message, palette),
            Some(Popup::Info) => popup::render_info(
                f,
                screen,
                self.controller.object(),
                self.controller.session().can_edit,
                palette,
            ),
            None => {}
        }
    }

    fn draw_surface(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let (_, border_color, bg_color) = palette.get_panel_colors(self.focus == Focus::Surface);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(bg_color));
        let inner = block.inner(area);
        f.render_widget(block, area);
        self.surface_area = inner;

        if let Some(message) = &self.render_error {
            let error = Paragraph::new(Span::styled(message.as_str(), Style::default().fg(palette.base_08)));
            f.render_widget(error, inner);
            return;
        }
        if let Some(image) = self.page_image.as_ref() {
            let view = (inner.width, inner.height);
            self.scroll.clamp_to(surface::page_cells(image), view);
        }

        let now = Instant::now();
        let widget = PageSurface::new(self.page_image.as_deref(), palette)
            .scroll(self.scroll)
            .markers(
                &self.controller.comments().markers,
                self.controller.highlighted(now),
            )
            .draft(self.controller.compose.draft())
            .night_mode(self.controller.view.night_mode);
        f.render_widget(widget, inner);
    }

    fn draw_top_bar(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let view = &self.controller.view;
        let name = self
            .controller
            .object()
            .map(|o| o.name.as_str())
            .unwrap_or(self.controller.object_id());
        let dim = Style::default().fg(palette.base_03);
        let bright = Style::default().fg(palette.base_06);

        let mut spans = vec![
            Span::styled(format!(" {name} "), bright.add_modifier(Modifier::BOLD)),
            Span::styled("│ ", dim),
            Span::styled(format!("Page {} / {} ", view.page, view.page_count), bright),
            Span::styled("│ ", dim),
            Span::styled(format!("{}% ", view.zoom.percent()), bright),
        ];
        if !view.zoom.is_default() {
            spans.push(Span::styled("[0] reset ", Style::default().fg(palette.base_0c)));
        }
        spans.push(Span::styled("│ ", dim));
        spans.push(Span::styled(format!("{} ", view.mode.label()), bright));
        if view.night_mode {
            spans.push(Span::styled("│ ", dim));
            spans.push(Span::styled("night ", Style::default().fg(palette.base_0e)));
        }
        if let Some(status) = self.controller.object().and_then(|o| o.status) {
            spans.push(Span::styled("│ ", dim));
            spans.push(Span::styled(
                status.as_str(),
                Style::default()
                    .fg(palette.status_color(status))
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.base_01));
        f.render_widget(bar, area);
    }

    fn draw_status_bar(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let line = match self.notifications.current() {
            Some(n) => {
                let color = match n.level {
                    NotificationLevel::Info => palette.base_0b,
                    NotificationLevel::Warning => palette.base_0a,
                    NotificationLevel::Error => palette.base_08,
                };
                Line::from(Span::styled(format!(" {}", n.message), Style::default().fg(color)))
            }
            None => {
                let hints = if self.controller.compose.is_composing() {
                    " Enter save · Shift+Enter newline · Esc cancel"
                } else {
                    " ←/→ page · +/-/0 zoom · m mode · n night · t theme · o outline · i info · Tab focus · q quit"
                };
                Line::from(Span::styled(hints, Style::default().fg(palette.base_03)))
            }
        };
        f.render_widget(Paragraph::new(line).style(Style::default().bg(palette.base_01)), area);
    }
}

pub async fn run_app_with_event_source<B: Backend, A: ObjectApi>(
    terminal: &mut Terminal<B>,
    app: &mut App<A>,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    app.should_quit = false;
    app.start().await;
    let mut needs_redraw = true;
    loop {
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            needs_redraw = false;
        }

        if event_source.poll(TICK_RATE)? {
            let event = event_source.read()?;
            app.handle_event(event).await;
            needs_redraw = true;
        }

        if app.tick(Instant::now()) {
            needs_redraw = true;
        }

        if app.should_quit() {
            info!("Quitting");
            return Ok(());
        }
    }
}
