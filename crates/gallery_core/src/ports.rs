//! crates/gallery_core/src/ports.rs
//!
//! Defines the service contract for the upstream content API.
//! The engines in this crate only ever talk to the upstream through this trait,
//! which keeps them independent of the HTTP client that implements it.

use async_trait::async_trait;

use crate::raw::{RawGallery, RawSearchPage};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every gateway operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Gallery not found: {0}")]
    NotFound(String),
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Unknown type: {0}")]
    UnknownRequestType(String),
    #[error("Unknown image token: {0}")]
    UnknownFormatToken(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only access to the upstream gallery API.
///
/// Implementations apply their own request timeout and never retry.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    /// `GET /api/galleries/search`. `sort` is omitted from the request when `None`.
    async fn search_galleries(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        sort: Option<&str>,
    ) -> PortResult<RawSearchPage>;

    /// `GET /api/gallery/{id}`. Fails with `NotFound` when the upstream answers 4xx.
    async fn get_gallery_by_id(&self, id: u64) -> PortResult<RawGallery>;

    /// `GET /api/galleries/all`, newest first.
    async fn list_all(&self, page: u32, per_page: u32) -> PortResult<RawSearchPage>;
}
