//! services/gateway/src/web/dispatcher.rs
//!
//! The request switchboard: decodes one inbound message, runs the matching
//! handler and produces exactly one reply. Failures never escape; they become
//! `ServerMessage::Error`.

use crate::web::{
    protocol::{
        BookListing, ClientMessage, FavoritesListing, FavoritesRequest, FilterTag, Paging,
        SearchRequest, ServerMessage,
    },
    state::AppState,
};
use gallery_core::{
    batch::fetch_many,
    domain::{Book, TagKind},
    normalize::normalize,
    ports::{PortError, PortResult},
    raw::RawSearchPage,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Query sent upstream when the client supplied nothing to search for.
const BLANK_QUERY: &str = " ";

/// Sort values accepted for the popular listing.
const POPULAR_SORTS: [&str; 4] = ["popular", "popular-today", "popular-week", "popular-month"];

/// Decodes `text`, handles it and returns the reply to send.
pub async fn dispatch(state: &AppState, text: &str) -> ServerMessage {
    let result = match parse_request(text) {
        Ok(request) => handle(state, request).await,
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|e| {
        warn!(error = %e, "Request failed");
        ServerMessage::Error {
            message: e.to_string(),
        }
    })
}

/// Decodes an inbound message, telling malformed input apart from an
/// unknown request type.
pub fn parse_request(text: &str) -> PortResult<ClientMessage> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| PortError::InvalidRequest(format!("Malformed message: {}", e)))?;

    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| PortError::InvalidRequest("Message type missing".to_string()))?;

    if !ClientMessage::KNOWN_TYPES.contains(&kind) {
        return Err(PortError::UnknownRequestType(kind.to_string()));
    }

    serde_json::from_value(value).map_err(|e| PortError::InvalidRequest(e.to_string()))
}

async fn handle(state: &AppState, request: ClientMessage) -> PortResult<ServerMessage> {
    debug!(?request, "Dispatching request");
    match request {
        ClientMessage::GetBook(req) => {
            let id = req
                .id
                .filter(|id| *id > 0)
                .ok_or_else(|| PortError::InvalidRequest("ID missing".to_string()))?;
            let raw = state.api.get_gallery_by_id(id).await?;
            let book = normalize(&raw, &state.scheme)?;
            Ok(ServerMessage::BookReply {
                book: Box::new(book),
            })
        }
        ClientMessage::SearchBooks(req) => search_books(state, req).await,
        ClientMessage::GetFavorites(req) => get_favorites(state, req).await,
        ClientMessage::GetRelatedBooks(req) => {
            let id = req
                .id
                .filter(|id| *id > 0)
                .ok_or_else(|| PortError::InvalidRequest("ID missing".to_string()))?;
            let books = state.recommender.related_to(id).await?;
            Ok(ServerMessage::RelatedBooksReply { books })
        }
        ClientMessage::GetTags => Ok(ServerMessage::TagsReply {
            tags: state.taxonomy.entries().collect(),
            updated: state.taxonomy.updated().map(str::to_string),
        }),
        ClientMessage::GetNewUploads(paging) => {
            let (page, per_page) = paging.resolve();
            let found = state.api.list_all(page, per_page).await?;
            Ok(ServerMessage::NewUploadsReply(listing(state, found, page)?))
        }
        ClientMessage::GetPopular(paging) => popular(state, paging, "popular").await,
        ClientMessage::GetPopularToday(paging) => popular(state, paging, "popular-today").await,
        ClientMessage::GetPopularWeek(paging) => popular(state, paging, "popular-week").await,
        ClientMessage::GetPopularMonth(paging) => popular(state, paging, "popular-month").await,
    }
}

//=========================================================================================
// Search
//=========================================================================================

async fn popular(state: &AppState, paging: Paging, sort: &str) -> PortResult<ServerMessage> {
    let (page, per_page) = paging.resolve();
    let found = state
        .api
        .search_galleries(BLANK_QUERY, page, per_page, Some(sort))
        .await?;
    Ok(ServerMessage::PopularBooksReply(listing(state, found, page)?))
}

async fn search_books(state: &AppState, req: SearchRequest) -> PortResult<ServerMessage> {
    let (page, per_page) = req.paging.resolve();
    let query = composite_query(
        req.query.as_deref().unwrap_or(""),
        req.filter_tags.as_deref().unwrap_or(&[]),
    );
    let content_type = req.content_type.as_deref();
    let sort = effective_sort(content_type, req.sort.as_deref());

    let upstream_query = if query.is_empty() { BLANK_QUERY } else { query.as_str() };
    let found = state
        .api
        .search_galleries(upstream_query, page, per_page, sort)
        .await?;
    let books = listing(state, found, page)?;

    Ok(match content_type {
        Some("new") => ServerMessage::NewUploadsReply(books),
        Some("popular") => ServerMessage::PopularBooksReply(books),
        _ => ServerMessage::SearchResultsReply(books),
    })
}

/// Joins the free-text query with one `type:"name"` clause per filter tag.
pub fn composite_query(query: &str, filter_tags: &[FilterTag]) -> String {
    let mut parts = Vec::with_capacity(filter_tags.len() + 1);
    let query = query.trim();
    if !query.is_empty() {
        parts.push(query.to_string());
    }
    for tag in filter_tags {
        let (kind, name) = match tag {
            FilterTag::Name(name) => (TagKind::Tag.as_str(), name.as_str()),
            FilterTag::Typed { kind, name } => (singular(kind), name.as_str()),
        };
        if !name.trim().is_empty() {
            parts.push(format!("{}:\"{}\"", kind, name));
        }
    }
    parts.join(" ")
}

/// `artists` -> `artist`. Known categories map through their plural form so
/// that `parodies` and `categories` come out right; anything else just loses
/// a trailing `s`.
fn singular(kind: &str) -> &str {
    if let Some(known) = TagKind::ALL.into_iter().find(|k| k.plural() == kind) {
        return known.as_str();
    }
    kind.strip_suffix('s').unwrap_or(kind)
}

/// The sort actually sent upstream for a given content type.
pub fn effective_sort<'a>(content_type: Option<&str>, sort: Option<&'a str>) -> Option<&'a str> {
    match content_type {
        Some("new") => Some("date"),
        Some("popular") => match sort {
            Some(s) if POPULAR_SORTS.contains(&s) => Some(s),
            _ => Some("popular"),
        },
        _ => sort.filter(|s| !s.is_empty()),
    }
}

fn listing(state: &AppState, found: RawSearchPage, page: u32) -> PortResult<BookListing> {
    let books = found
        .result
        .iter()
        .map(|raw| normalize(raw, &state.scheme))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BookListing {
        books,
        total_pages: found.num_pages.max(1),
        current_page: page,
    })
}

//=========================================================================================
// Favorites
//=========================================================================================

async fn get_favorites(state: &AppState, req: FavoritesRequest) -> PortResult<ServerMessage> {
    let ids = req.ids.unwrap_or_default();
    if ids.is_empty() {
        return Err(PortError::InvalidRequest("Ids array required".to_string()));
    }
    let (page, per_page) = req.paging.resolve();

    let mut books = fetch_many(state.api.as_ref(), &state.scheme, &ids).await;
    order_favorites(&mut books, &ids, req.sort.as_deref());

    let total_items = books.len();
    let total_pages = total_items.div_ceil(per_page as usize).max(1) as u32;
    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let books: Vec<Book> = books
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Ok(ServerMessage::FavoritesReply(FavoritesListing {
        books,
        total_pages,
        current_page: page,
        total_items,
    }))
}

/// `popular` sorts by favorites, most first. Anything else restores the order
/// of `ids`.
fn order_favorites(books: &mut [Book], ids: &[u64], sort: Option<&str>) {
    let mut position = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        position.entry(*id).or_insert(i);
    }
    books.sort_by_key(|book| position.get(&book.id).copied().unwrap_or(usize::MAX));

    if sort == Some("popular") {
        books.sort_by(|a, b| b.favorites_count.cmp(&a.favorites_count));
    }
}
