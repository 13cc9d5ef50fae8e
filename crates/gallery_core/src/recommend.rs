//! crates/gallery_core/src/recommend.rs
//!
//! The related-galleries engine.
//!
//! Given a seed gallery it gathers a candidate pool from several concurrent
//! search pages (plus a popular-today fallback when the pool is thin), scores
//! each candidate against the seed and returns the best few.
//!
//! A candidate's score is the sum of
//! - `weight(type) * rarity(tag)` for every tag it shares with the seed,
//! - the flat `weight(type)` once more for every category channel
//!   (artist, parody, character, group, category, language) it shares,
//! - `favorites / popularity_divisor`,
//!
//! multiplied by a freshness factor that decays linearly per 30-day month
//! down to a floor.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{Book, Tag, TagKind};
use crate::normalize::{normalize, UrlScheme};
use crate::ports::{GalleryApi, PortResult};
use crate::raw::RawGallery;
use crate::taxonomy::TaxonomyTable;

pub const RESULT_SIZE: usize = 6;
pub const SEARCH_PAGES: u32 = 4;
pub const SEARCH_PER_PAGE: u32 = 50;
pub const SEARCH_SORT: &str = "popular";
pub const MIN_POOL_SIZE: usize = 30;
pub const FALLBACK_SORT: &str = "popular-today";
pub const FALLBACK_PER_PAGE: u32 = 50;
pub const FALLBACK_TAG_NAMES: usize = 10;
pub const MIN_SCORE: f64 = 2.0;
pub const DECAY_PER_MONTH: f64 = 0.1;
pub const FRESHNESS_FLOOR: f64 = 0.4;
pub const POPULARITY_DIVISOR: f64 = 15_000.0;

const SECONDS_PER_MONTH: f64 = 30.0 * 24.0 * 60.0 * 60.0;

/// Categories that earn the flat multi-channel bonus.
const CHANNELS: [TagKind; 6] = [
    TagKind::Artist,
    TagKind::Parody,
    TagKind::Character,
    TagKind::Group,
    TagKind::Category,
    TagKind::Language,
];

/// Categories that make up the primary search query, in query order.
const QUERY_KINDS: [TagKind; 3] = [TagKind::Artist, TagKind::Parody, TagKind::Category];

/// Fixed weight per tag category.
pub fn type_weight(kind: TagKind) -> f64 {
    match kind {
        TagKind::Artist => 4.0,
        TagKind::Parody => 3.0,
        TagKind::Character => 2.5,
        TagKind::Group => 2.0,
        TagKind::Category => 2.0,
        TagKind::Tag => 1.0,
        TagKind::Language => 0.5,
    }
}

/// Tuning knobs for the engine. `Default` gives the reference behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendConfig {
    pub result_size: usize,
    pub search_pages: u32,
    pub search_per_page: u32,
    pub search_sort: String,
    pub min_pool_size: usize,
    pub fallback_sort: String,
    pub fallback_per_page: u32,
    pub fallback_tag_names: usize,
    pub min_score: f64,
    pub decay_per_month: f64,
    pub freshness_floor: f64,
    pub popularity_divisor: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            result_size: RESULT_SIZE,
            search_pages: SEARCH_PAGES,
            search_per_page: SEARCH_PER_PAGE,
            search_sort: SEARCH_SORT.to_string(),
            min_pool_size: MIN_POOL_SIZE,
            fallback_sort: FALLBACK_SORT.to_string(),
            fallback_per_page: FALLBACK_PER_PAGE,
            fallback_tag_names: FALLBACK_TAG_NAMES,
            min_score: MIN_SCORE,
            decay_per_month: DECAY_PER_MONTH,
            freshness_floor: FRESHNESS_FLOOR,
            popularity_divisor: POPULARITY_DIVISOR,
        }
    }
}

/// A candidate with its computed similarity. Lives only for one request.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub book: Book,
    pub score: f64,
}

//=========================================================================================
// Scoring
//=========================================================================================

/// Inverse-frequency boost: `ln((total + 1) / (frequency + 1))`.
///
/// The frequency comes from the taxonomy, then from the tag's own upstream
/// count, and defaults to 1.
pub fn rarity_boost(tag: &Tag, taxonomy: &TaxonomyTable) -> f64 {
    let frequency = tag
        .kind()
        .and_then(|kind| taxonomy.frequency(kind, &tag.name))
        .or(tag.count)
        .unwrap_or(1);
    let total = taxonomy.total_usage() as f64;
    ((total + 1.0) / (frequency as f64 + 1.0)).ln()
}

/// Multiplier in `[floor, 1]`. Galleries without an upload date get the floor.
pub fn freshness(
    uploaded_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &RecommendConfig,
) -> f64 {
    let Some(uploaded_at) = uploaded_at else {
        return config.freshness_floor;
    };
    let months = ((now - uploaded_at).num_seconds() as f64 / SECONDS_PER_MONTH).max(0.0);
    (1.0 - months * config.decay_per_month).max(config.freshness_floor)
}

fn shares_tag(seed: &Book, tag: &Tag) -> bool {
    seed.tags
        .iter()
        .any(|s| s.kind == tag.kind && s.name == tag.name)
}

fn shares_channel(seed: &Book, candidate: &Book, kind: TagKind) -> bool {
    let seed_names = seed.subset(kind);
    candidate
        .subset(kind)
        .iter()
        .any(|c| seed_names.iter().any(|s| s.name == c.name))
}

pub fn score_candidate(
    seed: &Book,
    candidate: &Book,
    taxonomy: &TaxonomyTable,
    config: &RecommendConfig,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = 0.0;

    for tag in &candidate.tags {
        let Some(kind) = tag.kind() else { continue };
        if shares_tag(seed, tag) {
            score += type_weight(kind) * rarity_boost(tag, taxonomy);
        }
    }

    // Deliberately counted again on top of the tag loop.
    for kind in CHANNELS {
        if shares_channel(seed, candidate, kind) {
            score += type_weight(kind);
        }
    }

    score += candidate.favorites_count as f64 / config.popularity_divisor;

    score * freshness(candidate.uploaded_at, now, config)
}

/// The search query used to gather candidates for `seed`.
pub fn primary_query(seed: &Book, config: &RecommendConfig) -> String {
    let clauses: Vec<String> = QUERY_KINDS
        .into_iter()
        .flat_map(|kind| seed.subset(kind))
        .map(|tag| format!("{}:\"{}\"", tag.kind, tag.name))
        .collect();

    if !clauses.is_empty() {
        return clauses.join(" ");
    }

    seed.tags
        .iter()
        .take(config.fallback_tag_names)
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

//=========================================================================================
// Engine
//=========================================================================================

pub struct Recommender {
    api: Arc<dyn GalleryApi>,
    taxonomy: Arc<TaxonomyTable>,
    scheme: UrlScheme,
    config: RecommendConfig,
}

impl Recommender {
    pub fn new(
        api: Arc<dyn GalleryApi>,
        taxonomy: Arc<TaxonomyTable>,
        scheme: UrlScheme,
        config: RecommendConfig,
    ) -> Self {
        Self {
            api,
            taxonomy,
            scheme,
            config,
        }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Galleries related to `seed_id`, best first.
    pub async fn related_to(&self, seed_id: u64) -> PortResult<Vec<Book>> {
        self.related_to_at(seed_id, Utc::now()).await
    }

    pub async fn related_to_at(&self, seed_id: u64, now: DateTime<Utc>) -> PortResult<Vec<Book>> {
        let raw_seed = self.api.get_gallery_by_id(seed_id).await?;
        let seed = normalize(&raw_seed, &self.scheme)?;

        let query = primary_query(&seed, &self.config);
        debug!(seed_id, query = %query, "Gathering related candidates");
        let pool = self.candidate_pool(&query).await;

        let ranked = self.rank(&seed, &pool, now);
        info!(
            seed_id,
            pool = pool.len(),
            kept = ranked.len(),
            "Related galleries computed"
        );

        Ok(ranked
            .into_iter()
            .take(self.config.result_size)
            .map(|candidate| candidate.book)
            .collect())
    }

    /// Concurrent paginated search, plus the fallback page when the pool is
    /// smaller than `min_pool_size`. Failed pages contribute nothing.
    async fn candidate_pool(&self, query: &str) -> Vec<RawGallery> {
        let query = if query.trim().is_empty() { " " } else { query };
        let sort = self.config.search_sort.as_str();
        let per_page = self.config.search_per_page;

        let pages = join_all((1..=self.config.search_pages).map(|page| async move {
            (page, self.api.search_galleries(query, page, per_page, Some(sort)).await)
        }))
        .await;

        let mut pool = Vec::new();
        for (page, result) in pages {
            match result {
                Ok(found) => pool.extend(found.result),
                Err(e) => warn!(page, error = %e, "Candidate page failed, skipping"),
            }
        }

        if pool.len() < self.config.min_pool_size {
            debug!(pool = pool.len(), "Candidate pool is thin, adding fallback");
            match self
                .api
                .search_galleries(
                    " ",
                    1,
                    self.config.fallback_per_page,
                    Some(self.config.fallback_sort.as_str()),
                )
                .await
            {
                Ok(found) => pool.extend(found.result),
                Err(e) => warn!(error = %e, "Fallback candidates unavailable"),
            }
        }

        pool
    }

    /// Scores the pool against `seed`, drops the seed, duplicates and
    /// low scorers, and sorts best first. Ties keep pool order.
    pub fn rank(
        &self,
        seed: &Book,
        pool: &[RawGallery],
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let mut seen = HashSet::from([seed.id]);
        let mut scored = Vec::new();

        for raw in pool {
            if !seen.insert(raw.id) {
                continue;
            }
            let book = match normalize(raw, &self.scheme) {
                Ok(book) => book,
                Err(e) => {
                    warn!(id = raw.id, error = %e, "Skipping candidate");
                    continue;
                }
            };
            let score = score_candidate(seed, &book, &self.taxonomy, &self.config, now);
            if score >= self.config.min_score {
                scored.push(ScoredCandidate { book, score });
            }
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }
}
