//! services/gateway/src/adapters/upstream.rs
//!
//! The HTTP adapter for the upstream content API. It implements the
//! `GalleryApi` port from the `core` crate on top of a single pooled
//! `reqwest::Client`.

use async_trait::async_trait;
use gallery_core::ports::{GalleryApi, PortError, PortResult};
use gallery_core::raw::{RawGallery, RawSearchPage};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `GalleryApi` port over HTTP.
#[derive(Clone)]
pub struct HttpGalleryApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGalleryApi {
    /// Creates a new `HttpGalleryApi`. The client keeps connections alive and
    /// applies `timeout` to every request.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> PortResult<T> {
        let url = self.endpoint(path);
        debug!(url = %url, ?params, "Querying upstream");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| PortError::UpstreamUnavailable(e.to_string()))?;

        if let Some(err) = classify_status(response.status(), path) {
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                PortError::UpstreamUnavailable(e.to_string())
            } else {
                PortError::Unexpected(format!("Invalid upstream payload from {}: {}", path, e))
            }
        })
    }
}

/// Maps an upstream status to the port error it stands for, if any.
fn classify_status(status: StatusCode, path: &str) -> Option<PortError> {
    if status.is_success() {
        None
    } else if status.is_client_error() {
        Some(PortError::NotFound(format!("{} ({})", path, status)))
    } else {
        Some(PortError::UpstreamUnavailable(format!("{} returned {}", path, status)))
    }
}

//=========================================================================================
// `GalleryApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl GalleryApi for HttpGalleryApi {
    async fn search_galleries(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        sort: Option<&str>,
    ) -> PortResult<RawSearchPage> {
        let mut params = vec![
            ("query", query.to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(sort) = sort.filter(|s| !s.is_empty()) {
            params.push(("sort", sort.to_string()));
        }
        self.get_json("/api/galleries/search", &params).await
    }

    async fn get_gallery_by_id(&self, id: u64) -> PortResult<RawGallery> {
        self.get_json(&format!("/api/gallery/{}", id), &[]).await
    }

    async fn list_all(&self, page: u32, per_page: u32) -> PortResult<RawSearchPage> {
        let params = [("page", page.to_string()), ("per_page", per_page.to_string())];
        self.get_json("/api/galleries/all", &params).await
    }
}
