//! crates/gallery_core/src/raw.rs
//!
//! The upstream gallery schema, exactly as the content API sends it.
//!
//! Everything the API may omit is optional here; the normalizer decides what a
//! missing field means. Numeric ids are accepted either as JSON numbers or as
//! numeric strings because the API is not consistent about it.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct RawGallery {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub media_id: u64,
    #[serde(default)]
    pub title: RawTitle,
    #[serde(default)]
    pub upload_date: Option<i64>,
    #[serde(default)]
    pub num_favorites: Option<u64>,
    #[serde(default)]
    pub num_pages: Option<u32>,
    #[serde(default)]
    pub scanlator: Option<String>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub images: RawImages,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTitle {
    pub english: Option<String>,
    pub japanese: Option<String>,
    pub pretty: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTag {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImages {
    #[serde(default)]
    pub pages: Vec<RawImage>,
    pub cover: Option<RawImage>,
    pub thumbnail: Option<RawImage>,
}

/// An image descriptor. `t` is the single-character format token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    pub t: Option<String>,
    pub w: Option<u32>,
    pub h: Option<u32>,
}

/// One page of search or listing results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchPage {
    #[serde(default)]
    pub result: Vec<RawGallery>,
    /// Result-set page count as reported by the API.
    #[serde(default)]
    pub num_pages: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
