use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::types::{ObjectInfo, ObjectStatus};
use super::ObjectApi;
use crate::comments::{Comment, CommentSet};

/// In-process [`ObjectApi`] keeping objects in memory.
///
/// Comments are stored the way the server stores them, as serialized text,
/// so reads go through the same decoder as real responses. Failures can be
/// queued for the next reads or writes.
#[derive(Debug, Default)]
pub struct MemoryObjectApi {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: HashMap<String, ObjectInfo>,
    documents: HashMap<String, Vec<u8>>,
    projects: HashMap<String, Vec<String>>,
    read_failures: VecDeque<ApiError>,
    write_failures: VecDeque<ApiError>,
    deleted_reviews: Vec<String>,
    writes: usize,
}

impl MemoryObjectApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked while holding it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds or replaces an object with the given comments.
    pub fn insert_object(&self, object_id: &str, name: &str, comments: Vec<Comment>) {
        let stored = CommentSet::new(comments).to_payload().to_string();
        let object = ObjectInfo {
            id: object_id.to_string(),
            name: name.to_string(),
            status: Some(ObjectStatus::NoReview),
            comments: Value::String(stored),
            ..ObjectInfo::default()
        };
        self.state().objects.insert(object_id.to_string(), object);
    }

    /// Stores the comment field verbatim, e.g. a legacy bare array.
    pub fn set_raw_comments(&self, object_id: &str, comments: Value) {
        if let Some(object) = self.state().objects.get_mut(object_id) {
            object.comments = comments;
        }
    }

    pub fn update_object(&self, object_id: &str, update: impl FnOnce(&mut ObjectInfo)) {
        if let Some(object) = self.state().objects.get_mut(object_id) {
            update(object);
        }
    }

    pub fn insert_document(&self, object_id: &str, bytes: Vec<u8>) {
        self.state().documents.insert(object_id.to_string(), bytes);
    }

    pub fn add_to_project(&self, project_id: &str, object_id: &str) {
        self.state()
            .projects
            .entry(project_id.to_string())
            .or_default()
            .push(object_id.to_string());
    }

    pub fn fail_next_read(&self, error: ApiError) {
        self.state().read_failures.push_back(error);
    }

    pub fn fail_next_write(&self, error: ApiError) {
        self.state().write_failures.push_back(error);
    }

    /// Stored comments of an object, decoded.
    pub fn comments(&self, object_id: &str) -> CommentSet {
        self.state()
            .objects
            .get(object_id)
            .and_then(|object| CommentSet::from_value(&object.comments).ok())
            .unwrap_or_default()
    }

    pub fn status(&self, object_id: &str) -> Option<ObjectStatus> {
        self.state().objects.get(object_id).and_then(|o| o.status)
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    pub fn deleted_reviews(&self) -> Vec<String> {
        self.state().deleted_reviews.clone()
    }

    fn begin_read(&self) -> ApiResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.state();
        let failure = state.read_failures.pop_front();
        match failure {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }

    fn begin_write(&self) -> ApiResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.state();
        let failure = state.write_failures.pop_front();
        match failure {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

impl ObjectApi for MemoryObjectApi {
    async fn fetch_object(&self, object_id: &str) -> ApiResult<ObjectInfo> {
        let state = self.begin_read()?;
        state
            .objects
            .get(object_id)
            .cloned()
            .ok_or(ApiError::status(404))
    }

    async fn replace_comments(&self, object_id: &str, comments: &CommentSet) -> ApiResult<()> {
        let mut state = self.begin_write()?;
        let object = state
            .objects
            .get_mut(object_id)
            .ok_or(ApiError::status(404))?;
        object.comments = Value::String(comments.to_payload().to_string());
        state.writes += 1;
        Ok(())
    }

    async fn set_status(&self, object_id: &str, status: ObjectStatus) -> ApiResult<()> {
        let mut state = self.begin_write()?;
        let object = state
            .objects
            .get_mut(object_id)
            .ok_or(ApiError::status(404))?;
        object.status = Some(status);
        state.writes += 1;
        Ok(())
    }

    async fn fetch_document(&self, object_id: &str) -> ApiResult<Vec<u8>> {
        let state = self.begin_read()?;
        state
            .documents
            .get(object_id)
            .cloned()
            .ok_or_else(|| ApiError::parse(format!("object {object_id} has no document data")))
    }

    async fn list_project_objects(&self, project_id: &str) -> ApiResult<Vec<ObjectInfo>> {
        let state = self.begin_read()?;
        let ids = state.projects.get(project_id).ok_or(ApiError::status(403))?;
        Ok(ids
            .iter()
            .filter_map(|id| state.objects.get(id).cloned())
            .collect())
    }

    async fn delete_review(&self, review_id: &str) -> ApiResult<()> {
        let mut state = self.begin_write()?;
        state.deleted_reviews.push(review_id.to_string());
        Ok(())
    }
}
