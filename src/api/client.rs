use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, error, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde_json::{Value, json};

use super::error::{ApiError, ApiResult};
use super::types::{ObjectEnvelope, ObjectInfo, ObjectListEnvelope, ObjectStatus};
use super::ObjectApi;
use crate::comments::CommentSet;

const API_KEY_HEADER: &str = "x-api-key";
const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// [`ObjectApi`] over HTTP.
///
/// The client has no timeout and no retry policy: a stalled request stalls
/// the action that issued it.
#[derive(Clone, Debug)]
pub struct HttpObjectApi {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpObjectApi {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid server URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("Server URL cannot be used as a base: {base_url}");
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("roundview/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await.map_err(|err| {
            error!("Request failed: {err}");
            ApiError::from(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} responded with {}", response.url(), status);
            return Err(ApiError::status(status.as_u16()));
        }
        Ok(response)
    }

    async fn get_object(&self, object_id: &str, raw: bool) -> ApiResult<ObjectInfo> {
        let mut url = self.endpoint(&["api", "objects", object_id]);
        if raw {
            url.query_pairs_mut().append_pair("raw", "1");
        }
        debug!("GET {url}");

        let response = self.send(self.request(Method::GET, url)).await?;
        let envelope: ObjectEnvelope = response.json().await.map_err(|err| {
            error!("Error in JSON for object {object_id}: {err}");
            ApiError::from(err)
        })?;
        Ok(envelope.object)
    }

    async fn put_object(&self, object_id: &str, body: Value) -> ApiResult<()> {
        let url = self.endpoint(&["api", "objects", object_id]);
        debug!("PUT {url}");

        let builder = self
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(&body);
        let response = self.send(builder).await?;
        debug!("PUT object {object_id}: {}", response.status());
        Ok(())
    }
}

impl ObjectApi for HttpObjectApi {
    async fn fetch_object(&self, object_id: &str) -> ApiResult<ObjectInfo> {
        self.get_object(object_id, false).await
    }

    async fn replace_comments(&self, object_id: &str, comments: &CommentSet) -> ApiResult<()> {
        self.put_object(object_id, json!({ "comments": comments.to_payload() }))
            .await
    }

    async fn set_status(&self, object_id: &str, status: ObjectStatus) -> ApiResult<()> {
        self.put_object(object_id, json!({ "status": status })).await
    }

    async fn fetch_document(&self, object_id: &str) -> ApiResult<Vec<u8>> {
        let object = self.get_object(object_id, true).await?;
        let raw = object
            .raw
            .ok_or_else(|| ApiError::parse(format!("object {object_id} has no document data")))?;
        Ok(STANDARD.decode(raw.trim())?)
    }

    async fn list_project_objects(&self, project_id: &str) -> ApiResult<Vec<ObjectInfo>> {
        let url = self.endpoint(&["api", "projects", project_id, "objects"]);
        debug!("GET {url}");

        let response = self.send(self.request(Method::GET, url)).await?;
        let envelope: ObjectListEnvelope = response.json().await?;
        Ok(envelope.objects)
    }

    async fn delete_review(&self, review_id: &str) -> ApiResult<()> {
        let url = self.endpoint(&["api", "reviews", review_id]);
        debug!("DELETE {url}");

        let builder = self
            .request(Method::DELETE, url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        self.send(builder).await?;
        Ok(())
    }
}
