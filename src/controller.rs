//! Comment interaction for one document object.
//!
//! [`CommentController`] owns the session of a viewed object: its view
//! state, the comment composition, the markers and sidebar rows built from
//! the last fetch, and the transient highlight. Every mutation is a
//! read-modify-write of the whole collection followed by a settle delay
//! and a full reload.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::api::{ApiError, ObjectApi, ObjectInfo, ObjectStatus};
use crate::comments::{Author, Comment, CommentSet};
use crate::view::{Command, DisplayMode, Effect, ViewState};

/// Wait between a write and the reload that follows it.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// How long a located or clicked comment stays highlighted.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(1500);

pub const LOAD_ERROR_MESSAGE: &str = "Error loading comments, please try again";
pub const EMPTY_MESSAGE: &str = "No comments on this page.";

/// Identity and capabilities of the current user, fixed for the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub author: Author,
    pub can_comment: bool,
    pub can_edit: bool,
}

/// A comment being typed at a point of the page surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    pub page: u32,
    /// Surface position of the click
    pub point: (f64, f64),
    /// Scale the surface was rendered at when clicked
    pub scale: f64,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ComposeState {
    #[default]
    Idle,
    Composing(Draft),
}

/// Keys understood by the composition input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposeKey {
    Char(char),
    /// Shift+Enter
    Newline,
    Enter,
    Backspace,
    Escape,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ComposeOutcome {
    /// Still composing
    Editing,
    /// Input closed with a draft to persist
    Submit(Draft),
    /// Input closed, draft discarded
    Cancelled,
    /// Not composing; the key is not for the input
    Ignored,
}

impl ComposeState {
    pub fn is_composing(&self) -> bool {
        matches!(self, Self::Composing(_))
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            Self::Composing(draft) => Some(draft),
            Self::Idle => None,
        }
    }

    /// Opens the input at `point`, dropping any draft in progress.
    pub fn begin(&mut self, page: u32, point: (f64, f64), scale: f64) {
        if self.is_composing() {
            debug!("Discarding pending draft, input re-anchored");
        }
        *self = Self::Composing(Draft {
            page,
            point,
            scale,
            text: String::new(),
        });
    }

    pub fn handle_key(&mut self, key: ComposeKey) -> ComposeOutcome {
        let Self::Composing(draft) = self else {
            return ComposeOutcome::Ignored;
        };
        match key {
            ComposeKey::Char(c) => {
                draft.text.push(c);
                ComposeOutcome::Editing
            }
            ComposeKey::Newline => {
                draft.text.push('\n');
                ComposeOutcome::Editing
            }
            ComposeKey::Backspace => {
                draft.text.pop();
                ComposeOutcome::Editing
            }
            ComposeKey::Enter if draft.text.is_empty() => ComposeOutcome::Editing,
            ComposeKey::Enter => match std::mem::take(self) {
                Self::Composing(draft) => ComposeOutcome::Submit(draft),
                Self::Idle => ComposeOutcome::Ignored,
            },
            ComposeKey::Escape => {
                *self = Self::Idle;
                ComposeOutcome::Cancelled
            }
        }
    }
}

/// A numbered marker on the page surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: String,
    pub number: usize,
    /// Surface position at the current scale
    pub x: f64,
    pub y: f64,
    pub resolved: bool,
}

/// A numbered entry of the comment sidebar.
#[derive(Clone, Debug, PartialEq)]
pub struct SidebarRow {
    pub id: String,
    pub number: usize,
    pub page: u32,
    pub author_name: String,
    pub text: String,
    pub resolved: bool,
    /// Resolve and delete controls are offered
    pub editable: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SidebarContent {
    #[default]
    Loading,
    Error(String),
    /// Nothing to show; rendered as a placeholder message
    Empty,
    Rows(Vec<SidebarRow>),
}

impl SidebarContent {
    pub fn rows(&self) -> &[SidebarRow] {
        match self {
            Self::Rows(rows) => rows,
            _ => &[],
        }
    }
}

/// Markers and sidebar rows for the current page and mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommentView {
    pub markers: Vec<Marker>,
    pub sidebar: SidebarContent,
}

impl CommentView {
    pub fn count(&self) -> usize {
        self.sidebar.rows().len()
    }

    pub fn row(&self, id: &str) -> Option<&SidebarRow> {
        self.sidebar.rows().iter().find(|row| row.id == id)
    }

    pub fn row_index(&self, id: &str) -> Option<usize> {
        self.sidebar.rows().iter().position(|row| row.id == id)
    }
}

/// Builds markers and sidebar rows from a full collection.
///
/// Per-page mode lists the comments of `view.page`; all-pages mode lists
/// every comment. Markers are always limited to the current page. Numbers
/// follow collection order.
pub fn build_view(comments: &[Comment], view: &ViewState, session: &Session) -> CommentView {
    let scale = view.scale();
    let mut markers = Vec::new();
    let mut rows = Vec::new();

    let visible = comments
        .iter()
        .filter(|c| view.mode == DisplayMode::All || c.is_on_page(view.page));

    for (number, comment) in (1..).zip(visible) {
        if comment.is_on_page(view.page) {
            let (x, y) = comment.surface_point(scale);
            markers.push(Marker {
                id: comment.id.clone(),
                number,
                x,
                y,
                resolved: comment.resolved,
            });
        }
        rows.push(SidebarRow {
            id: comment.id.clone(),
            number,
            page: comment.page,
            author_name: comment.author_name.clone(),
            text: comment.text.clone(),
            resolved: comment.resolved,
            editable: session.can_comment,
        });
    }

    let sidebar = if rows.is_empty() {
        SidebarContent::Empty
    } else {
        SidebarContent::Rows(rows)
    };
    CommentView { markers, sidebar }
}

/// A write on the comment collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommentAction {
    Create,
    /// Sets the resolved flag of a comment to `resolved`.
    Resolve { id: String, resolved: bool },
    Delete(String),
}

impl CommentAction {
    /// Text of the alert shown when the action fails.
    pub fn failure_message(&self, err: &ApiError) -> String {
        match self {
            Self::Create => format!("Error saving comment: {err}"),
            Self::Resolve { .. } => format!("Error resolving comment: {err}"),
            Self::Delete(_) => format!("Error removing comment: {err}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Highlight {
    id: String,
    expires_at: Instant,
}

pub struct CommentController<A> {
    api: A,
    object_id: String,
    session: Session,
    pub view: ViewState,
    pub compose: ComposeState,
    comments: CommentView,
    object: Option<ObjectInfo>,
    highlight: Option<Highlight>,
    settle_delay: Duration,
}

impl<A: ObjectApi> CommentController<A> {
    pub fn new(api: A, object_id: impl Into<String>, session: Session, view: ViewState) -> Self {
        Self {
            api,
            object_id: object_id.into(),
            session,
            view,
            compose: ComposeState::Idle,
            comments: CommentView::default(),
            object: None,
            highlight: None,
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn comments(&self) -> &CommentView {
        &self.comments
    }

    pub fn object(&self) -> Option<&ObjectInfo> {
        self.object.as_ref()
    }

    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        self.view.apply(cmd)
    }

    /// Reads the object metadata shown in the information panel.
    pub async fn load_object(&mut self) -> Result<(), ApiError> {
        let object = self.api.fetch_object(&self.object_id).await?;
        info!("Loaded object {} ({})", object.id, object.name);
        self.object = Some(object);
        Ok(())
    }

    /// Rebuilds markers and sidebar from a fresh fetch.
    ///
    /// A failed fetch leaves the markers cleared and the sidebar showing an
    /// inline error.
    pub async fn load_comments(&mut self) {
        self.comments = CommentView::default();
        match self.api.fetch_comments(&self.object_id).await {
            Ok(set) => {
                self.comments = build_view(set.as_slice(), &self.view, &self.session);
                debug!(
                    "Loaded {} comments, {} visible on page {}",
                    set.len(),
                    self.comments.count(),
                    self.view.page
                );
            }
            Err(err) => {
                error!("Failed to load comments for {}: {err}", self.object_id);
                self.comments.sidebar = SidebarContent::Error(LOAD_ERROR_MESSAGE.to_string());
            }
        }
    }

    /// Opens the composition input at a surface point of the current page.
    ///
    /// Returns false when the user may not comment.
    pub fn begin_compose(&mut self, point: (f64, f64)) -> bool {
        if !self.session.can_comment {
            return false;
        }
        self.compose
            .begin(self.view.page, point, self.view.scale());
        true
    }

    /// Feeds a key to the composition input and persists a submitted draft.
    ///
    /// `Ok(outcome)` also covers a submitted draft that was saved; a failed
    /// save is returned as `Err` after the reload ran.
    pub async fn compose_key(&mut self, key: ComposeKey) -> Result<ComposeOutcome, ApiError> {
        let outcome = self.compose.handle_key(key);
        if let ComposeOutcome::Submit(draft) = &outcome {
            self.submit_comment(draft).await?;
        }
        Ok(outcome)
    }

    /// Creates a comment from `draft` and pushes the whole collection.
    pub async fn submit_comment(&mut self, draft: &Draft) -> Result<(), ApiError> {
        if !self.session.can_comment {
            debug!("Comment creation ignored, commenting is disabled");
            return Ok(());
        }
        let result = self.create_comment(draft).await;
        self.settle_and_reload().await;
        result
    }

    async fn create_comment(&mut self, draft: &Draft) -> Result<(), ApiError> {
        let mut set = self.api.fetch_comments(&self.object_id).await?;
        let id = set.next_id(chrono::Utc::now().timestamp_millis());
        let comment = Comment::at_surface_point(
            id.clone(),
            draft.text.clone(),
            draft.point,
            draft.scale,
            draft.page,
            &self.session.author,
        );
        set.add(comment);
        self.api.replace_comments(&self.object_id, &set).await?;
        info!("Created {id} on page {}", draft.page);
        Ok(())
    }

    /// The resolve action offered for comment `id`, flipping the flag
    /// shown in its sidebar row.
    pub fn resolve_action(&self, id: &str) -> Option<CommentAction> {
        self.comments.row(id).map(|row| CommentAction::Resolve {
            id: id.to_string(),
            resolved: !row.resolved,
        })
    }

    /// Confirmation text required before `action`, if any.
    ///
    /// Deleting always asks; resolving only asks when it would undo a
    /// resolution.
    pub fn confirmation_for(&self, action: &CommentAction) -> Option<&'static str> {
        match action {
            CommentAction::Create => None,
            CommentAction::Delete(_) => Some("Are you sure to delete this comment?"),
            CommentAction::Resolve { resolved: false, .. } => {
                Some("Are you sure to UNDO resolving this comment?")
            }
            CommentAction::Resolve { resolved: true, .. } => None,
        }
    }

    /// Runs a confirmed resolve or delete.
    pub async fn perform(&mut self, action: &CommentAction) -> Result<(), ApiError> {
        match action {
            CommentAction::Create => Ok(()),
            CommentAction::Resolve { id, resolved } => self.set_resolved(id, *resolved).await,
            CommentAction::Delete(id) => self.delete_comment(id).await,
        }
    }

    /// Writes `resolved` onto comment `id`, whatever the stored value is.
    pub async fn set_resolved(&mut self, id: &str, resolved: bool) -> Result<(), ApiError> {
        self.rewrite(id, |set| set.set_resolved(id, resolved)).await
    }

    pub async fn delete_comment(&mut self, id: &str) -> Result<(), ApiError> {
        self.rewrite(id, |set| set.remove(id).is_some()).await
    }

    async fn rewrite(
        &mut self,
        id: &str,
        mutate: impl FnOnce(&mut CommentSet) -> bool,
    ) -> Result<(), ApiError> {
        if !self.session.can_comment {
            debug!("Change to {id} ignored, commenting is disabled");
            return Ok(());
        }
        let result = async {
            let mut set = self.api.fetch_comments(&self.object_id).await?;
            if !mutate(&mut set) {
                warn!("Comment {id} is no longer in the collection");
                return Ok(());
            }
            self.api.replace_comments(&self.object_id, &set).await
        }
        .await;
        self.settle_and_reload().await;
        result
    }

    async fn settle_and_reload(&mut self) {
        tokio::time::sleep(self.settle_delay).await;
        self.load_comments().await;
    }

    /// Moves to the page of comment `id` and highlights it.
    ///
    /// Returns the effects of the page change, empty when the comment is
    /// already on the current page or unknown.
    pub fn locate(&mut self, id: &str, now: Instant) -> Vec<Effect> {
        let Some(page) = self.comments.row(id).map(|row| row.page) else {
            return vec![];
        };
        self.highlight_at(id, now);
        self.view.apply(Command::GoToPage(page))
    }

    /// Highlights the sidebar row of a clicked marker.
    pub fn focus_from_marker(&mut self, id: &str, now: Instant) -> Option<usize> {
        let index = self.comments.row_index(id)?;
        self.highlight_at(id, now);
        Some(index)
    }

    fn highlight_at(&mut self, id: &str, now: Instant) {
        self.highlight = Some(Highlight {
            id: id.to_string(),
            expires_at: now + HIGHLIGHT_DURATION,
        });
    }

    pub fn highlighted(&self, now: Instant) -> Option<&str> {
        self.highlight
            .as_ref()
            .filter(|h| now < h.expires_at)
            .map(|h| h.id.as_str())
    }

    /// Drops an expired highlight. Returns true if one was removed.
    pub fn expire_highlight(&mut self, now: Instant) -> bool {
        if self.highlight.as_ref().is_some_and(|h| now >= h.expires_at) {
            self.highlight = None;
            return true;
        }
        false
    }

    /// Advances the object to the next review status.
    ///
    /// Returns the new status, or `None` when editing is disabled or the
    /// object is not loaded. On failure the previous status is kept.
    pub async fn cycle_status(&mut self) -> Result<Option<ObjectStatus>, ApiError> {
        if !self.session.can_edit {
            return Ok(None);
        }
        let Some(object) = self.object.as_mut() else {
            return Ok(None);
        };
        let next = object.status.map_or(ObjectStatus::NoReview, |s| s.next());
        self.api.set_status(&self.object_id, next).await?;
        object.status = Some(next);
        info!("Status of {} set to {next}", self.object_id);
        Ok(Some(next))
    }
}
