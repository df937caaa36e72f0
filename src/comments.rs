use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Identity stamped on comments created by the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub id: String,
}

impl Author {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// A comment anchored to a position on one page of a document.
///
/// `x` and `y` are unscaled document coordinates: the surface position at
/// creation divided by the zoom scale active at that time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub page: u32,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub resolved: bool,
}

impl Comment {
    /// Builds an unresolved comment from a point on a surface rendered at `scale`.
    pub fn at_surface_point(
        id: String,
        text: impl Into<String>,
        (px, py): (f64, f64),
        scale: f64,
        page: u32,
        author: &Author,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            x: px / scale,
            y: py / scale,
            page,
            author_name: author.name.clone(),
            author_id: author.id.clone(),
            resolved: false,
        }
    }

    /// Position on a surface rendered at `scale`.
    pub fn surface_point(&self, scale: f64) -> (f64, f64) {
        (self.x * scale, self.y * scale)
    }

    pub fn is_on_page(&self, page: u32) -> bool {
        self.page == page
    }
}

/// The two shapes the server has stored over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum CommentsPayload {
    Current {
        #[serde(rename = "inlineComments", default)]
        inline_comments: Vec<Comment>,
    },
    Legacy(Vec<Comment>),
}

impl From<CommentsPayload> for Vec<Comment> {
    fn from(payload: CommentsPayload) -> Self {
        match payload {
            CommentsPayload::Current { inline_comments } => inline_comments,
            CommentsPayload::Legacy(comments) => comments,
        }
    }
}

/// Decodes the `comments` field of an object.
///
/// The server keeps the field as serialized text, so it arrives either as
/// `null`, as a string holding JSON, or (from older deployments) as JSON
/// directly. Both a bare array and `{"inlineComments": [...]}` are accepted.
pub fn decode_comments(value: &Value) -> Result<Vec<Comment>, serde_json::Error> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => {
            if text.trim().is_empty() {
                return Ok(Vec::new());
            }
            let inner: Value = serde_json::from_str(text)?;
            if inner.is_string() {
                return Err(serde_json::Error::custom(
                    "comments field is encoded more than once",
                ));
            }
            decode_structured(inner)
        }
        other => decode_structured(other.clone()),
    }
}

fn decode_structured(value: Value) -> Result<Vec<Comment>, serde_json::Error> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let payload: CommentsPayload = serde_json::from_value(value)?;
    Ok(payload.into())
}

/// The full comment collection of one object.
///
/// Every mutation works on the whole collection, which is then written back
/// as a unit. Insertion order is preserved; nothing is sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentSet {
    comments: Vec<Comment>,
}

impl CommentSet {
    pub fn new(comments: Vec<Comment>) -> Self {
        Self { comments }
    }

    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        decode_comments(value).map(Self::new)
    }

    /// Body for the `comments` field of a PUT, always in the current shape.
    pub fn to_payload(&self) -> Value {
        json!({ "inlineComments": self.comments })
    }

    pub fn as_slice(&self) -> &[Comment] {
        &self.comments
    }

    pub fn into_vec(self) -> Vec<Comment> {
        self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn on_page(&self, page: u32) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(move |c| c.is_on_page(page))
    }

    /// A `comment-<millis>` id not yet used in this collection.
    pub fn next_id(&self, now_millis: i64) -> String {
        let mut stamp = now_millis;
        loop {
            let id = format!("comment-{stamp}");
            if !self.contains(&id) {
                return id;
            }
            stamp += 1;
        }
    }

    /// Appends a comment. A comment whose id is already taken is rejected.
    pub fn add(&mut self, comment: Comment) -> bool {
        if self.contains(&comment.id) {
            return false;
        }
        self.comments.push(comment);
        true
    }

    /// Flips `resolved` and returns the new value.
    pub fn toggle_resolved(&mut self, id: &str) -> Option<bool> {
        let comment = self.comments.iter_mut().find(|c| c.id == id)?;
        comment.resolved = !comment.resolved;
        Some(comment.resolved)
    }

    /// Sets `resolved` to `resolved`. Returns false for an unknown id.
    pub fn set_resolved(&mut self, id: &str, resolved: bool) -> bool {
        match self.comments.iter_mut().find(|c| c.id == id) {
            Some(comment) => {
                comment.resolved = resolved;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Comment> {
        let idx = self.comments.iter().position(|c| c.id == id)?;
        Some(self.comments.remove(idx))
    }
}

impl From<Vec<Comment>> for CommentSet {
    fn from(comments: Vec<Comment>) -> Self {
        Self::new(comments)
    }
}
