//! services/gateway/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the rich client and the gateway.
//! Every message is a JSON object discriminated by its `type` field.

use gallery_core::domain::Book;
use gallery_core::taxonomy::TypedEntry;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 25;

//=========================================================================================
// Messages Sent FROM the Client TO the Gateway
//=========================================================================================

/// Represents the requests a client can send to the gateway.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// A single gallery by id.
    GetBook(IdRequest),

    /// Free-text and tag search. The reply type depends on `contentType`.
    SearchBooks(SearchRequest),

    /// The client's favorites, fetched by id and paginated in memory.
    GetFavorites(FavoritesRequest),

    /// Galleries similar to the one with the given id.
    GetRelatedBooks(IdRequest),

    /// The static tag taxonomy.
    GetTags,

    /// The newest uploads.
    GetNewUploads(Paging),

    GetPopular(Paging),
    GetPopularToday(Paging),
    GetPopularWeek(Paging),
    GetPopularMonth(Paging),
}

impl ClientMessage {
    /// Every `type` value this protocol understands.
    pub const KNOWN_TYPES: [&'static str; 10] = [
        "get-book",
        "search-books",
        "get-favorites",
        "get-related-books",
        "get-tags",
        "get-new-uploads",
        "get-popular",
        "get-popular-today",
        "get-popular-week",
        "get-popular-month",
    ];
}

#[derive(Deserialize, Debug, Default)]
pub struct IdRequest {
    pub id: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Paging {
    /// Resolved `(page, per_page)`, with zero treated like an omitted field.
    pub fn resolve(self) -> (u32, u32) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let per_page = self.per_page.filter(|p| *p > 0).unwrap_or(DEFAULT_PER_PAGE);
        (page, per_page)
    }
}

/// A tag filter as sent by the client: either a bare tag name, or an object
/// carrying a (possibly pluralized) category and a name.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FilterTag {
    Name(String),
    Typed {
        #[serde(rename = "type")]
        kind: String,
        name: String,
    },
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(flatten)]
    pub paging: Paging,
    #[serde(default)]
    pub filter_tags: Option<Vec<FilterTag>>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesRequest {
    #[serde(default)]
    pub ids: Option<Vec<u64>>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(flatten)]
    pub paging: Paging,
}

//=========================================================================================
// Messages Sent FROM the Gateway TO the Client
//=========================================================================================

/// A page of books.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookListing {
    pub books: Vec<Book>,
    pub total_pages: u32,
    pub current_page: u32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesListing {
    pub books: Vec<Book>,
    pub total_pages: u32,
    pub current_page: u32,
    pub total_items: usize,
}

/// Represents the replies the gateway sends back. Each request type has exactly
/// one success variant; `Error` is shared by all of them.
#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    BookReply { book: Box<Book> },
    NewUploadsReply(BookListing),
    PopularBooksReply(BookListing),
    SearchResultsReply(BookListing),
    FavoritesReply(FavoritesListing),
    RelatedBooksReply { books: Vec<Book> },
    TagsReply {
        tags: Vec<TypedEntry>,
        updated: Option<String>,
    },
    /// Reports a failed request. The connection stays open.
    Error { message: String },
}
