//! crates/gallery_core/src/batch.rs
//!
//! Fetches many galleries by id at once, keeping whatever succeeds.

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::domain::Book;
use crate::normalize::{normalize, UrlScheme};
use crate::ports::{GalleryApi, PortError, PortResult};

async fn fetch_one(api: &dyn GalleryApi, scheme: &UrlScheme, id: u64) -> PortResult<Book> {
    let raw = api.get_gallery_by_id(id).await?;
    Ok(normalize(&raw, scheme)?)
}

/// Upper bound on lookups a single batch keeps in flight.
pub const MAX_IN_FLIGHT: usize = 16;

/// Issues one upstream lookup per id, at most `MAX_IN_FLIGHT` at a time, and
/// returns the books that resolved. Failed ids are dropped. Results come back
/// in completion order, not input order.
pub async fn fetch_many(api: &dyn GalleryApi, scheme: &UrlScheme, ids: &[u64]) -> Vec<Book> {
    let mut in_flight = stream::iter(ids.iter().copied())
        .map(|id| async move { (id, fetch_one(api, scheme, id).await) })
        .buffer_unordered(MAX_IN_FLIGHT);

    let mut books = Vec::with_capacity(ids.len());
    while let Some((id, result)) = in_flight.next().await {
        match result {
            Ok(book) => books.push(book),
            Err(PortError::NotFound(_)) => debug!(id, "Dropping unknown gallery from batch"),
            Err(e) => warn!(id, error = %e, "Dropping gallery from batch"),
        }
    }

    debug!(requested = ids.len(), fetched = books.len(), "Batch fetch complete");
    books
}


#[cfg(test)]
mod tests {
    use super::fake::{gallery, FakeApi};
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn drops_missing_and_failing_ids() {
        let mut api = FakeApi::default()
            .with_gallery(gallery(1, json!([])))
            .with_gallery(gallery(3, json!([])));
        api.unavailable.push(3);

        let books = fetch_many(&api, &UrlScheme::default(), &[1, 2, 3]).await;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, 1);
    }

    #[tokio::test]
    async fn drops_galleries_that_fail_normalization() {
        let mut bad = gallery(2, json!([]));
        bad.images.pages.push(crate::raw::RawImage {
            t: Some("?".to_string()),
            ..Default::default()
        });
        let api = FakeApi::default()
            .with_gallery(gallery(1, json!([])))
            .with_gallery(bad);

        let books = fetch_many(&api, &UrlScheme::default(), &[1, 2]).await;
        let ids: Vec<u64> = books.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn large_batches_keep_lookups_bounded() {
        let ids: Vec<u64> = (1..=100).collect();
        let api = ids
            .iter()
            .fold(FakeApi::default(), |api, &id| api.with_gallery(gallery(id, json!([]))));

        let books = fetch_many(&api, &UrlScheme::default(), &ids).await;
        assert_eq!(books.len(), ids.len());

        let peak = api.peak_lookups.load(std::sync::atomic::Ordering::SeqCst);
        assert!(peak > 1, "lookups ran one at a time");
        assert!(peak <= MAX_IN_FLIGHT, "{peak} lookups in flight");
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let api = FakeApi::default();
        assert!(fetch_many(&api, &UrlScheme::default(), &[]).await.is_empty());
    }
}
