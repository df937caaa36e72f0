//! Remote object API: reads and replaces the comment collection of a
//! document object, updates its status and downloads its content.
//!
//! Calls are single attempt with no timeout. A failed call ends the user
//! action that issued it; callers surface the error and never retry.

mod client;
mod error;
mod memory;
mod types;

pub use client::HttpObjectApi;
pub use error::{ApiError, ApiResult, TransportError};
pub use memory::MemoryObjectApi;
pub use types::{ObjectInfo, ObjectStatus};

use crate::comments::CommentSet;

/// Operations on `/api/objects/{id}` and related resources.
#[allow(async_fn_in_trait)]
pub trait ObjectApi {
    /// Reads the object metadata, including the stored comment field.
    async fn fetch_object(&self, object_id: &str) -> ApiResult<ObjectInfo>;

    /// Reads the full comment collection of an object.
    async fn fetch_comments(&self, object_id: &str) -> ApiResult<CommentSet> {
        let object = self.fetch_object(object_id).await?;
        CommentSet::from_value(&object.comments).map_err(|err| {
            log::error!("Malformed comments for object {object_id}: {err}");
            ApiError::from(err)
        })
    }

    /// Overwrites the stored comment collection with `comments`.
    async fn replace_comments(&self, object_id: &str, comments: &CommentSet) -> ApiResult<()>;

    async fn set_status(&self, object_id: &str, status: ObjectStatus) -> ApiResult<()>;

    /// Downloads the document bytes of an object.
    async fn fetch_document(&self, object_id: &str) -> ApiResult<Vec<u8>>;

    async fn list_project_objects(&self, project_id: &str) -> ApiResult<Vec<ObjectInfo>>;

    async fn delete_review(&self, review_id: &str) -> ApiResult<()>;
}

impl<T: ObjectApi> ObjectApi for &T {
    async fn fetch_object(&self, object_id: &str) -> ApiResult<ObjectInfo> {
        (**self).fetch_object(object_id).await
    }

    async fn fetch_comments(&self, object_id: &str) -> ApiResult<CommentSet> {
        (**self).fetch_comments(object_id).await
    }

    async fn replace_comments(&self, object_id: &str, comments: &CommentSet) -> ApiResult<()> {
        (**self).replace_comments(object_id, comments).await
    }

    async fn set_status(&self, object_id: &str, status: ObjectStatus) -> ApiResult<()> {
        (**self).set_status(object_id, status).await
    }

    async fn fetch_document(&self, object_id: &str) -> ApiResult<Vec<u8>> {
        (**self).fetch_document(object_id).await
    }

    async fn list_project_objects(&self, project_id: &str) -> ApiResult<Vec<ObjectInfo>> {
        (**self).list_project_objects(project_id).await
    }

    async fn delete_review(&self, review_id: &str) -> ApiResult<()> {
        (**self).delete_review(review_id).await
    }
}
