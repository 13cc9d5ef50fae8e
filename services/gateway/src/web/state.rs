//! services/gateway/src/web/state.rs
//!
//! Defines the application's shared state.

use gallery_core::{
    normalize::UrlScheme,
    ports::GalleryApi,
    recommend::{RecommendConfig, Recommender},
    taxonomy::TaxonomyTable,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Nothing in here is mutated after construction, so concurrent requests need
/// no locking.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn GalleryApi>,
    pub taxonomy: Arc<TaxonomyTable>,
    pub recommender: Arc<Recommender>,
    pub scheme: UrlScheme,
}

impl AppState {
    pub fn new(
        api: Arc<dyn GalleryApi>,
        taxonomy: Arc<TaxonomyTable>,
        scheme: UrlScheme,
        recommend_config: RecommendConfig,
    ) -> Self {
        let recommender = Arc::new(Recommender::new(
            api.clone(),
            taxonomy.clone(),
            scheme.clone(),
            recommend_config,
        ));
        Self {
            api,
            taxonomy,
            recommender,
            scheme,
        }
    }
}
