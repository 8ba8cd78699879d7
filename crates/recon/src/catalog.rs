//! Brand/Model Consolidator — merges per-source brand→models maps into
//! the additive, deduplicated, provenance-tagged catalog.

use crate::model::{BrandModelRecord, Catalog, ConsolidatedEntry};
use crate::normalize;

impl Catalog {
    /// Merge one source's record into the catalog. This is the only
    /// mutation path: it adds brands, source tags, and models, and never
    /// removes anything. A brand reported with zero models still
    /// registers the source — "reported with 0 models" is distinct from
    /// "brand absent".
    pub fn merge_record(&mut self, record: &BrandModelRecord) {
        for (brand, models) in &record.brands_models {
            let key = normalize::brand_key(brand);
            if key.is_empty() {
                continue;
            }
            let entry = self
                .entries
                .entry(key)
                .or_insert_with(|| ConsolidatedEntry::new(normalize::brand_display(brand)));
            entry.sources.insert(record.source_id.clone());
            for model in models {
                if let Some(normalized) = normalize::normalize_model(model) {
                    entry.models.insert(normalized);
                }
            }
        }
    }
}

/// Consolidate all sources into one catalog. Commutative and idempotent:
/// caller-supplied order does not affect the result, and re-running with
/// the same inputs yields an identical catalog.
pub fn consolidate(sources: &[BrandModelRecord]) -> Catalog {
    let mut catalog = Catalog::default();
    for record in sources {
        catalog.merge_record(record);
    }
    catalog
}
