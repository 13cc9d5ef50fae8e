//! services/gateway/src/adapters/taxonomy_file.rs
//!
//! Loads the static tag taxonomy snapshot from disk at startup.

use gallery_core::taxonomy::TaxonomyTable;
use std::path::Path;
use tracing::{info, warn};

/// Reads and parses the snapshot at `path`.
///
/// A missing or malformed file is not fatal: the gateway starts with an empty
/// taxonomy and rarity scoring falls back to its defaults.
pub fn load_taxonomy(path: &Path) -> TaxonomyTable {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Taxonomy snapshot unavailable, using empty taxonomy"
            );
            return TaxonomyTable::empty();
        }
    };

    match TaxonomyTable::from_json(&contents) {
        Ok(table) => {
            info!(
                path = %path.display(),
                entries = table.len(),
                updated = table.updated().unwrap_or("unknown"),
                "Taxonomy snapshot loaded"
            );
            table
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Taxonomy snapshot is malformed, using empty taxonomy"
            );
            TaxonomyTable::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_core::domain::TagKind;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("taxonomy-{}.json", Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_a_valid_snapshot() {
        let path = temp_file(
            r#"{
                "artists": [{ "id": 7, "name": "alpha", "count": 55 }],
                "updated": "2024-01-01"
            }"#,
        );
        let table = load_taxonomy(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(table.frequency(TagKind::Artist, "alpha"), Some(55));
        assert_eq!(table.updated(), Some("2024-01-01"));
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let table = load_taxonomy(Path::new("/definitely/not/here/tags.json"));
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_file_degrades_to_empty() {
        let path = temp_file("{ not json");
        let table = load_taxonomy(&path);
        std::fs::remove_file(&path).ok();
        assert!(table.is_empty());
    }
}
