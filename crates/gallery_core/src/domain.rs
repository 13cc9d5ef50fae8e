//! crates/gallery_core/src/domain.rs
//!
//! Defines the canonical data structures the gateway hands to the client.
//! These are produced by the normalizer and never mutated afterwards.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The closed set of tag categories the upstream API knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Tag,
    Artist,
    Character,
    Parody,
    Group,
    Category,
    Language,
}

impl TagKind {
    pub const ALL: [TagKind; 7] = [
        TagKind::Tag,
        TagKind::Artist,
        TagKind::Character,
        TagKind::Parody,
        TagKind::Group,
        TagKind::Category,
        TagKind::Language,
    ];

    /// The singular name used in the upstream `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::Tag => "tag",
            TagKind::Artist => "artist",
            TagKind::Character => "character",
            TagKind::Parody => "parody",
            TagKind::Group => "group",
            TagKind::Category => "category",
            TagKind::Language => "language",
        }
    }

    /// The pluralized key used by the taxonomy snapshot.
    pub fn plural(self) -> &'static str {
        match self {
            TagKind::Tag => "tags",
            TagKind::Artist => "artists",
            TagKind::Character => "characters",
            TagKind::Parody => "parodies",
            TagKind::Group => "groups",
            TagKind::Category => "categories",
            TagKind::Language => "languages",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

/// A single tag attached to a gallery.
///
/// `kind` keeps the upstream `type` string verbatim; use [`Tag::kind`] for the
/// typed category. Matching is always exact string equality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl Tag {
    pub fn kind(&self) -> Option<TagKind> {
        self.kind.parse().ok()
    }

    pub fn is(&self, kind: TagKind) -> bool {
        self.kind == kind.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Title {
    pub english: String,
    pub japanese: String,
    pub pretty: String,
}

/// One page of a gallery. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub page: u32,
    pub url: String,
    #[serde(rename = "urlThumb")]
    pub url_thumb: String,
}

/// The canonical gallery record.
///
/// `id` is the only identity key. The category subsets are filled by the
/// normalizer from `tags` and are never edited independently.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u64,
    pub title: Title,
    #[serde(rename = "uploaded", serialize_with = "serialize_upload_date")]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(rename = "media")]
    pub media_id: u64,
    #[serde(rename = "favorites")]
    pub favorites_count: u64,
    #[serde(rename = "pagesCount")]
    pub page_count: u32,
    pub scanlator: String,
    pub tags: Vec<Tag>,
    #[serde(rename = "cover")]
    pub cover_url: String,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: String,
    pub pages: Vec<Page>,
    pub artists: Vec<Tag>,
    pub characters: Vec<Tag>,
    pub parodies: Vec<Tag>,
    pub groups: Vec<Tag>,
    pub categories: Vec<Tag>,
    pub languages: Vec<Tag>,
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Book {}

impl Book {
    /// Returns the derived subset for a category. Plain `tag` entries have no
    /// subset of their own and come back as an empty slice.
    pub fn subset(&self, kind: TagKind) -> &[Tag] {
        match kind {
            TagKind::Artist => &self.artists,
            TagKind::Character => &self.characters,
            TagKind::Parody => &self.parodies,
            TagKind::Group => &self.groups,
            TagKind::Category => &self.categories,
            TagKind::Language => &self.languages,
            TagKind::Tag => &[],
        }
    }

    /// ISO-8601 upload time, or an empty string when upstream sent none.
    pub fn uploaded_iso(&self) -> String {
        format_upload_date(self.uploaded_at)
    }
}

fn format_upload_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn serialize_upload_date<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_upload_date(*date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tag_kind_round_trips_through_its_name() {
        for kind in TagKind::ALL {
            assert_eq!(kind.as_str().parse::<TagKind>(), Ok(kind));
        }
        assert!("artists".parse::<TagKind>().is_err());
        assert!("Artist".parse::<TagKind>().is_err());
    }

    #[test]
    fn upload_date_serializes_as_iso_or_empty() {
        let date = Utc.timestamp_opt(1_700_000_000, 0).single();
        assert_eq!(format_upload_date(date), "2023-11-14T22:13:20.000Z");
        assert_eq!(format_upload_date(None), "");
    }
}
