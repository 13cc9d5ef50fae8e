//! crates/gallery_core/src/normalize.rs
//!
//! Turns one raw upstream gallery into a canonical `Book`.
//!
//! Normalization is pure: the same raw input always yields the same `Book`,
//! including the image host chosen for every page.

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{Book, Page, Tag, TagKind, Title};
use crate::ports::PortError;
use crate::raw::{RawGallery, RawImage};

/// Full-resolution page hosts, selected round-robin per page.
const IMAGE_HOSTS: [&str; 3] = ["i1", "i2", "i3"];
/// Host serving covers and gallery thumbnails.
const COVER_HOST: &str = "t3";
/// Host serving per-page thumbnails.
const PAGE_THUMB_HOST: &str = "t1";
const DEFAULT_DOMAIN: &str = "nhentai.net";
/// Token assumed when the upstream omits an image descriptor.
const DEFAULT_TOKEN: char = 'j';

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("Unknown image token: {0:?}")]
    UnknownFormatToken(String),
}

impl From<NormalizeError> for PortError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::UnknownFormatToken(token) => PortError::UnknownFormatToken(token),
        }
    }
}

//=========================================================================================
// Format Tokens
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpg,
    Png,
    Webp,
    Gif,
}

/// A decoded format token. Upper-case tokens are the webp-fallback variants,
/// which the image hosts serve with a second `.webp` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatToken {
    pub format: ImageFormat,
    pub webp_fallback: bool,
}

impl FormatToken {
    pub fn from_char(token: char) -> Result<Self, NormalizeError> {
        let format = match token.to_ascii_lowercase() {
            'j' => ImageFormat::Jpg,
            'p' => ImageFormat::Png,
            'w' => ImageFormat::Webp,
            'g' => ImageFormat::Gif,
            _ => return Err(NormalizeError::UnknownFormatToken(token.to_string())),
        };
        Ok(Self {
            format,
            webp_fallback: token.is_ascii_uppercase(),
        })
    }

    /// Resolves an optional upstream descriptor. Absent or empty tokens fall back
    /// to the default; anything that is not exactly one known character fails.
    pub fn resolve(image: Option<&RawImage>) -> Result<Self, NormalizeError> {
        let token = image.and_then(|i| i.t.as_deref()).unwrap_or("");
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Self::from_char(DEFAULT_TOKEN),
            (Some(c), None) => Self::from_char(c),
            _ => Err(NormalizeError::UnknownFormatToken(token.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match (self.format, self.webp_fallback) {
            (ImageFormat::Jpg, false) => "jpg",
            (ImageFormat::Jpg, true) => "jpg.webp",
            (ImageFormat::Png, false) => "png",
            (ImageFormat::Png, true) => "png.webp",
            (ImageFormat::Webp, false) => "webp",
            (ImageFormat::Webp, true) => "webp.webp",
            (ImageFormat::Gif, false) => "gif",
            (ImageFormat::Gif, true) => "gif.webp",
        }
    }
}

//=========================================================================================
// URL Synthesis
//=========================================================================================

/// Where synthesized image URLs point. Host names are fixed; only the domain
/// can be swapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlScheme {
    domain: String,
}

impl Default for UrlScheme {
    fn default() -> Self {
        Self::with_domain(DEFAULT_DOMAIN)
    }
}

impl UrlScheme {
    pub fn with_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Round-robin host for page `page` (1-based) of gallery `media_id`.
    pub fn page_host(&self, media_id: u64, page: u32) -> &'static str {
        let n = IMAGE_HOSTS.len() as u64;
        let idx = (media_id % n + u64::from(page) % n) % n;
        IMAGE_HOSTS[idx as usize]
    }

    fn gallery_url(&self, host: &str, media_id: u64, file: &str, ext: &str) -> String {
        format!("https://{host}.{}/galleries/{media_id}/{file}.{ext}", self.domain)
    }

    pub fn cover_url(&self, media_id: u64, token: FormatToken) -> String {
        self.gallery_url(COVER_HOST, media_id, "cover", token.extension())
    }

    pub fn thumbnail_url(&self, media_id: u64, token: FormatToken) -> String {
        self.gallery_url(COVER_HOST, media_id, "thumb", token.extension())
    }

    pub fn page_url(&self, media_id: u64, page: u32, token: FormatToken) -> String {
        let host = self.page_host(media_id, page);
        self.gallery_url(host, media_id, &page.to_string(), token.extension())
    }

    pub fn page_thumb_url(&self, media_id: u64, page: u32, token: FormatToken) -> String {
        self.gallery_url(PAGE_THUMB_HOST, media_id, &format!("{page}t"), token.extension())
    }
}

//=========================================================================================
// Normalization
//=========================================================================================

/// Converts a raw upstream gallery into a `Book`.
pub fn normalize(raw: &RawGallery, scheme: &UrlScheme) -> Result<Book, NormalizeError> {
    let media_id = raw.media_id;
    let page_count = raw.num_pages.unwrap_or(0);

    let cover_token = FormatToken::resolve(raw.images.cover.as_ref())?;
    let thumb_token = FormatToken::resolve(raw.images.thumbnail.as_ref())?;

    let pages = (1..=page_count)
        .map(|page| {
            let token = FormatToken::resolve(raw.images.pages.get(page as usize - 1))?;
            Ok(Page {
                page,
                url: scheme.page_url(media_id, page, token),
                url_thumb: scheme.page_thumb_url(media_id, page, token),
            })
        })
        .collect::<Result<Vec<_>, NormalizeError>>()?;

    let tags: Vec<Tag> = raw
        .tags
        .iter()
        .map(|t| Tag {
            id: t.id,
            kind: t.kind.clone(),
            name: t.name.clone(),
            count: t.count,
        })
        .collect();

    let mut artists = Vec::new();
    let mut characters = Vec::new();
    let mut parodies = Vec::new();
    let mut groups = Vec::new();
    let mut categories = Vec::new();
    let mut languages = Vec::new();
    for tag in &tags {
        let bucket = match tag.kind() {
            Some(TagKind::Artist) => &mut artists,
            Some(TagKind::Character) => &mut characters,
            Some(TagKind::Parody) => &mut parodies,
            Some(TagKind::Group) => &mut groups,
            Some(TagKind::Category) => &mut categories,
            Some(TagKind::Language) => &mut languages,
            Some(TagKind::Tag) | None => continue,
        };
        bucket.push(tag.clone());
    }

    Ok(Book {
        id: raw.id,
        title: Title {
            english: raw.title.english.clone().unwrap_or_default(),
            japanese: raw.title.japanese.clone().unwrap_or_default(),
            pretty: raw.title.pretty.clone().unwrap_or_default(),
        },
        uploaded_at: raw.upload_date.and_then(epoch_to_utc),
        media_id,
        favorites_count: raw.num_favorites.unwrap_or(0),
        page_count,
        scanlator: raw.scanlator.clone().unwrap_or_default(),
        tags,
        cover_url: scheme.cover_url(media_id, cover_token),
        thumbnail_url: scheme.thumbnail_url(media_id, thumb_token),
        pages,
        artists,
        characters,
        parodies,
        groups,
        categories,
        languages,
    })
}

fn epoch_to_utc(seconds: i64) -> Option<DateTime<Utc>> {
    // A zero timestamp counts as absent.
    if seconds == 0 {
        return None;
    }
    Utc.timestamp_opt(seconds, 0).single()
}
