//! crates/gallery_core/src/taxonomy.rs
//!
//! The static tag taxonomy: known tags per category with their usage counts.
//! Loaded once at startup and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::TagKind;

/// Used when the snapshot does not carry `totalTagUsage`.
pub const DEFAULT_TOTAL_USAGE: u64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

/// The snapshot document as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomySnapshot {
    #[serde(default)]
    pub tags: Vec<TaxonomyEntry>,
    #[serde(default)]
    pub artists: Vec<TaxonomyEntry>,
    #[serde(default)]
    pub characters: Vec<TaxonomyEntry>,
    #[serde(default)]
    pub parodies: Vec<TaxonomyEntry>,
    #[serde(default)]
    pub groups: Vec<TaxonomyEntry>,
    #[serde(default)]
    pub categories: Vec<TaxonomyEntry>,
    #[serde(default)]
    pub languages: Vec<TaxonomyEntry>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub total_tag_usage: Option<u64>,
}

impl TaxonomySnapshot {
    pub fn category(&self, kind: TagKind) -> &[TaxonomyEntry] {
        match kind {
            TagKind::Tag => &self.tags,
            TagKind::Artist => &self.artists,
            TagKind::Character => &self.characters,
            TagKind::Parody => &self.parodies,
            TagKind::Group => &self.groups,
            TagKind::Category => &self.categories,
            TagKind::Language => &self.languages,
        }
    }
}

/// A flattened taxonomy entry carrying its singular category name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedEntry {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub count: u64,
}

/// Read-only lookup table built from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyTable {
    snapshot: TaxonomySnapshot,
    frequencies: HashMap<(TagKind, String), u64>,
}

impl TaxonomyTable {
    pub fn new(snapshot: TaxonomySnapshot) -> Self {
        let mut frequencies = HashMap::new();
        for kind in TagKind::ALL {
            for entry in snapshot.category(kind) {
                frequencies
                    .entry((kind, entry.name.clone()))
                    .or_insert(entry.count);
            }
        }
        Self {
            snapshot,
            frequencies,
        }
    }

    /// An empty taxonomy: every category empty, default total usage.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<TaxonomySnapshot>(json).map(Self::new)
    }

    pub fn frequency(&self, kind: TagKind, name: &str) -> Option<u64> {
        self.frequencies.get(&(kind, name.to_string())).copied()
    }

    pub fn total_usage(&self) -> u64 {
        self.snapshot.total_tag_usage.unwrap_or(DEFAULT_TOTAL_USAGE)
    }

    pub fn updated(&self) -> Option<&str> {
        self.snapshot.updated.as_deref()
    }

    pub fn len(&self) -> usize {
        TagKind::ALL
            .into_iter()
            .map(|kind| self.snapshot.category(kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> &TaxonomySnapshot {
        &self.snapshot
    }

    /// Every entry across all categories, in snapshot order, category by category.
    pub fn entries(&self) -> impl Iterator<Item = TypedEntry> + '_ {
        TagKind::ALL.into_iter().flat_map(move |kind| {
            self.snapshot
                .category(kind)
                .iter()
                .map(move |entry| TypedEntry {
                    id: entry.id,
                    kind: kind.as_str(),
                    name: entry.name.clone(),
                    count: entry.count,
                })
        })
    }
}
