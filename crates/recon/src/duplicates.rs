//! Duplicate/Overlap Detector — reports cross-source agreement on
//! (brand, model) pairs. Read-only; the union in the consolidator
//! already dedupes, so duplicates here are audit evidence, not errors.

use std::collections::BTreeSet;

use crate::model::{BrandModelRecord, DuplicateRecord};
use crate::normalize;

/// For the given brand, intersect `candidate_models` (by normalized
/// name) with each existing catalog that already carries the brand.
/// Every model in an intersection yields one [`DuplicateRecord`] naming
/// the pre-existing source.
pub fn detect_duplicates(
    brand: &str,
    candidate_models: &[String],
    new_source: &str,
    existing_catalogs: &[BrandModelRecord],
) -> Vec<DuplicateRecord> {
    let key = normalize::brand_key(brand);
    let candidates: BTreeSet<String> = candidate_models
        .iter()
        .filter_map(|m| normalize::normalize_model(m))
        .collect();

    let mut records = Vec::new();
    for catalog in existing_catalogs {
        let Some(models) = catalog
            .brands_models
            .iter()
            .find(|(b, _)| normalize::brand_key(b) == key)
            .map(|(_, models)| models)
        else {
            continue;
        };

        let existing: BTreeSet<String> = models
            .iter()
            .filter_map(|m| normalize::normalize_model(m))
            .collect();

        for model in candidates.intersection(&existing) {
            records.push(DuplicateRecord {
                brand: normalize::brand_display(brand),
                model: model.clone(),
                existing_source: catalog.source_id.clone(),
                new_source: new_source.to_string(),
            });
        }
    }
    records
}
