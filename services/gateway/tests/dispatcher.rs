//! End-to-end dispatcher behavior against an in-memory upstream.

use async_trait::async_trait;
use gallery_core::{
    normalize::UrlScheme,
    ports::{GalleryApi, PortError, PortResult},
    raw::{RawGallery, RawSearchPage},
    recommend::RecommendConfig,
    taxonomy::TaxonomyTable,
};
use gateway_lib::web::{dispatch, state::AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeUpstream {
    galleries: HashMap<u64, RawGallery>,
    search_result: Vec<RawGallery>,
    searches: Mutex<Vec<(String, u32, u32, Option<String>)>>,
    listings: Mutex<Vec<(u32, u32)>>,
}

#[async_trait]
impl GalleryApi for FakeUpstream {
    async fn search_galleries(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        sort: Option<&str>,
    ) -> PortResult<RawSearchPage> {
        self.searches.lock().unwrap().push((
            query.to_string(),
            page,
            per_page,
            sort.map(str::to_string),
        ));
        Ok(RawSearchPage {
            result: self.search_result.clone(),
            num_pages: 7,
            per_page: Some(per_page),
        })
    }

    async fn get_gallery_by_id(&self, id: u64) -> PortResult<RawGallery> {
        self.galleries
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(id.to_string()))
    }

    async fn list_all(&self, page: u32, per_page: u32) -> PortResult<RawSearchPage> {
        self.listings.lock().unwrap().push((page, per_page));
        Ok(RawSearchPage {
            result: self.search_result.clone(),
            num_pages: 3,
            per_page: Some(per_page),
        })
    }
}

fn gallery(id: u64, favorites: u64, tags: Value) -> RawGallery {
    serde_json::from_value(json!({
        "id": id,
        "media_id": id + 1000,
        "title": {
            "english": format!("Book {id}"),
            "japanese": "",
            "pretty": format!("Book {id}")
        },
        "upload_date": 1_700_000_000,
        "num_favorites": favorites,
        "num_pages": 2,
        "tags": tags,
        "images": {
            "pages": [{ "t": "j" }, { "t": "p" }],
            "cover": { "t": "j" },
            "thumbnail": { "t": "j" }
        }
    }))
    .unwrap()
}

fn artist(name: &str) -> Value {
    json!([{ "id": 1, "type": "artist", "name": name }])
}

fn state_with(upstream: Arc<FakeUpstream>, taxonomy: TaxonomyTable) -> AppState {
    AppState::new(
        upstream,
        Arc::new(taxonomy),
        UrlScheme::default(),
        RecommendConfig::default(),
    )
}

fn favorites_upstream() -> Arc<FakeUpstream> {
    let mut upstream = FakeUpstream::default();
    for (id, favorites) in [(10, 5), (20, 500), (30, 50), (40, 5000)] {
        upstream.galleries.insert(id, gallery(id, favorites, json!([])));
    }
    Arc::new(upstream)
}

async fn send(state: &AppState, request: Value) -> Value {
    let reply = dispatch(state, &request.to_string()).await;
    serde_json::to_value(&reply).unwrap()
}

fn ids(reply: &Value) -> Vec<u64> {
    reply["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn get_book_returns_normalized_book() {
    let mut upstream = FakeUpstream::default();
    upstream.galleries.insert(5, gallery(5, 12, artist("alpha")));
    let state = state_with(Arc::new(upstream), TaxonomyTable::empty());

    let reply = send(&state, json!({ "type": "get-book", "id": 5 })).await;

    assert_eq!(reply["type"], "book-reply");
    let book = &reply["book"];
    assert_eq!(book["id"], 5);
    assert_eq!(book["pagesCount"], 2);
    assert_eq!(book["favorites"], 12);
    assert_eq!(book["uploaded"], "2023-11-14T22:13:20.000Z");
    assert_eq!(book["cover"], "https://t3.nhentai.net/galleries/1005/cover.jpg");
    assert_eq!(book["pages"][1]["page"], 2);
    assert_eq!(book["pages"][1]["urlThumb"], "https://t1.nhentai.net/galleries/1005/2t.png");
    assert_eq!(book["artists"][0]["name"], "alpha");
}

#[tokio::test]
async fn get_book_failures_become_error_replies() {
    let state = state_with(Arc::new(FakeUpstream::default()), TaxonomyTable::empty());

    let missing = send(&state, json!({ "type": "get-book" })).await;
    assert_eq!(missing, json!({ "type": "error", "message": "Invalid request: ID missing" }));

    let unknown = send(&state, json!({ "type": "get-book", "id": 404 })).await;
    assert_eq!(unknown["type"], "error");
    assert!(unknown["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn malformed_and_unknown_messages_do_not_poison_later_requests() {
    let mut upstream = FakeUpstream::default();
    upstream.galleries.insert(1, gallery(1, 0, json!([])));
    let state = state_with(Arc::new(upstream), TaxonomyTable::empty());

    let malformed = serde_json::to_value(dispatch(&state, "{not json").await).unwrap();
    assert_eq!(malformed["type"], "error");

    let unknown = send(&state, json!({ "type": "get-everything" })).await;
    assert_eq!(unknown, json!({ "type": "error", "message": "Unknown type: get-everything" }));

    let ok = send(&state, json!({ "type": "get-book", "id": 1 })).await;
    assert_eq!(ok["type"], "book-reply");
}

#[tokio::test]
async fn favorites_sorted_by_popularity() {
    let state = state_with(favorites_upstream(), TaxonomyTable::empty());

    let reply = send(
        &state,
        json!({ "type": "get-favorites", "ids": [10, 20, 30, 40], "sort": "popular" }),
    )
    .await;

    assert_eq!(reply["type"], "favorites-reply");
    assert_eq!(ids(&reply), vec![40, 20, 30, 10]);
    let favorites: Vec<u64> = reply["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["favorites"].as_u64().unwrap())
        .collect();
    assert!(favorites.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn favorites_by_relevance_keep_input_order_and_drop_missing() {
    let state = state_with(favorites_upstream(), TaxonomyTable::empty());

    let reply = send(&state, json!({ "type": "get-favorites", "ids": [30, 99, 10, 40] })).await;

    assert_eq!(ids(&reply), vec![30, 10, 40]);
    assert_eq!(reply["totalItems"], 3);
    assert_eq!(reply["totalPages"], 1);
    assert_eq!(reply["currentPage"], 1);
}

#[tokio::test]
async fn favorites_are_paginated_in_memory() {
    let state = state_with(favorites_upstream(), TaxonomyTable::empty());

    let reply = send(
        &state,
        json!({
            "type": "get-favorites",
            "ids": [10, 20, 30, 40],
            "sort": "relevance",
            "page": 2,
            "perPage": 3
        }),
    )
    .await;

    assert_eq!(ids(&reply), vec![40]);
    assert_eq!(reply["totalPages"], 2);
    assert_eq!(reply["currentPage"], 2);
    assert_eq!(reply["totalItems"], 4);
}

#[tokio::test]
async fn favorites_require_ids() {
    let state = state_with(favorites_upstream(), TaxonomyTable::empty());
    let reply = send(&state, json!({ "type": "get-favorites", "ids": [] })).await;
    assert_eq!(reply["type"], "error");
}

#[tokio::test]
async fn search_for_new_content_forces_date_sort() {
    let upstream = Arc::new(FakeUpstream {
        search_result: vec![gallery(3, 0, json!([]))],
        ..Default::default()
    });
    let state = state_with(upstream.clone(), TaxonomyTable::empty());

    let reply = send(
        &state,
        json!({
            "type": "search-books",
            "query": "maid",
            "sort": "popular-week",
            "page": 2,
            "filterTags": [{ "type": "languages", "name": "english" }],
            "contentType": "new"
        }),
    )
    .await;

    assert_eq!(reply["type"], "new-uploads-reply");
    assert_eq!(reply["totalPages"], 7);
    assert_eq!(reply["currentPage"], 2);
    assert_eq!(ids(&reply), vec![3]);

    let searches = upstream.searches.lock().unwrap().clone();
    assert_eq!(
        searches,
        vec![(
            r#"maid language:"english""#.to_string(),
            2,
            25,
            Some("date".to_string())
        )]
    );
}

#[tokio::test]
async fn search_reply_type_follows_content_type() {
    let upstream = Arc::new(FakeUpstream::default());
    let state = state_with(upstream.clone(), TaxonomyTable::empty());

    let popular = send(
        &state,
        json!({ "type": "search-books", "sort": "date", "contentType": "popular" }),
    )
    .await;
    assert_eq!(popular["type"], "popular-books-reply");

    let plain = send(&state, json!({ "type": "search-books", "query": "x", "sort": "" })).await;
    assert_eq!(plain["type"], "search-results-reply");

    let searches = upstream.searches.lock().unwrap().clone();
    assert_eq!(searches[0], (" ".to_string(), 1, 25, Some("popular".to_string())));
    assert_eq!(searches[1], ("x".to_string(), 1, 25, None));
}

#[tokio::test]
async fn legacy_listing_requests_are_served() {
    let upstream = Arc::new(FakeUpstream::default());
    let state = state_with(upstream.clone(), TaxonomyTable::empty());

    let new = send(&state, json!({ "type": "get-new-uploads", "page": 4 })).await;
    assert_eq!(new["type"], "new-uploads-reply");
    assert_eq!(new["totalPages"], 3);
    assert_eq!(upstream.listings.lock().unwrap().clone(), vec![(4, 25)]);

    let popular = send(&state, json!({ "type": "get-popular-week" })).await;
    assert_eq!(popular["type"], "popular-books-reply");
    let searches = upstream.searches.lock().unwrap().clone();
    assert_eq!(searches, vec![(" ".to_string(), 1, 25, Some("popular-week".to_string()))]);
}

#[tokio::test]
async fn related_books_exclude_the_seed() {
    let seed_tags = artist("alpha");
    let mut upstream = FakeUpstream::default();
    upstream.galleries.insert(1, gallery(1, 100, seed_tags.clone()));
    upstream.search_result = vec![
        gallery(1, 100, seed_tags.clone()),
        gallery(2, 30_000, seed_tags.clone()),
        gallery(3, 0, json!([])),
    ];
    let state = state_with(Arc::new(upstream), TaxonomyTable::empty());

    let reply = send(&state, json!({ "type": "get-related-books", "id": 1 })).await;

    assert_eq!(reply["type"], "related-books-reply");
    let related = ids(&reply);
    assert!(!related.contains(&1));
    assert!(related.len() <= 6);
    assert_eq!(related[0], 2);
}

#[tokio::test]
async fn related_books_for_unknown_seed_is_an_error() {
    let state = state_with(Arc::new(FakeUpstream::default()), TaxonomyTable::empty());
    let reply = send(&state, json!({ "type": "get-related-books", "id": 77 })).await;
    assert_eq!(reply["type"], "error");
}

#[tokio::test]
async fn get_tags_returns_the_taxonomy() {
    let taxonomy = TaxonomyTable::from_json(
        r#"{
            "tags": [{ "id": 1, "name": "glasses", "count": 10 }],
            "artists": [{ "id": 2, "name": "alpha", "count": 3 }],
            "updated": "2024-05-01"
        }"#,
    )
    .unwrap();
    let state = state_with(Arc::new(FakeUpstream::default()), taxonomy);

    let reply = send(&state, json!({ "type": "get-tags" })).await;

    assert_eq!(
        reply,
        json!({
            "type": "tags-reply",
            "tags": [
                { "id": 1, "type": "tag", "name": "glasses", "count": 10 },
                { "id": 2, "type": "artist", "name": "alpha", "count": 3 }
            ],
            "updated": "2024-05-01"
        })
    );
}
