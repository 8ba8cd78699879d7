//! Summary statistics over consolidation and spec-merge outputs.

use std::collections::BTreeMap;

use crate::model::{
    Catalog, ConsolidationSummary, CoverageReport, DuplicateRecord, MergedSpecRecord,
    ModelCompleteness, SpecCategory,
};

/// Compute consolidation statistics from the final catalog.
pub fn compute_summary(catalog: &Catalog, duplicates: &[DuplicateRecord]) -> ConsolidationSummary {
    let mut source_brand_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut brands_single_source: BTreeMap<String, usize> = BTreeMap::new();
    let mut brands_multi_source = 0;

    for entry in catalog.entries() {
        for source in &entry.sources {
            *source_brand_counts.entry(source.clone()).or_insert(0) += 1;
        }
        if entry.sources.len() > 1 {
            brands_multi_source += 1;
        } else if let Some(only) = entry.sources.iter().next() {
            *brands_single_source.entry(only.clone()).or_insert(0) += 1;
        }
    }

    ConsolidationSummary {
        total_brands: catalog.brand_count(),
        total_models: catalog.total_model_count(),
        source_brand_counts,
        brands_single_source,
        brands_multi_source,
        duplicate_count: duplicates.len(),
    }
}

/// Per-category coverage across merged records, plus the models meeting
/// the completeness threshold ranked most complete first.
pub fn compute_coverage(records: &[MergedSpecRecord], min_categories: usize) -> CoverageReport {
    let mut category_models: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        for category in SpecCategory::SCALAR {
            if record
                .scalars
                .get(&category)
                .is_some_and(|fields| !fields.is_empty())
            {
                *category_models.entry(category.to_string()).or_insert(0) += 1;
            }
        }
        if !record.equipment.is_empty() {
            *category_models
                .entry(SpecCategory::Equipment.to_string())
                .or_insert(0) += 1;
        }
    }

    let mut most_complete: Vec<ModelCompleteness> = records
        .iter()
        .filter(|r| r.filled_categories() >= min_categories)
        .map(|r| ModelCompleteness {
            brand: r.brand.clone(),
            model: r.model.clone(),
            filled_categories: r.filled_categories(),
        })
        .collect();
    most_complete.sort_by(|a, b| {
        b.filled_categories
            .cmp(&a.filled_categories)
            .then_with(|| a.brand.cmp(&b.brand))
            .then_with(|| a.model.cmp(&b.model))
    });

    CoverageReport {
        total_models: records.len(),
        category_models,
        most_complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::consolidate;
    use crate::model::{BrandModelRecord, Confidence, FieldValue};
    use std::collections::BTreeMap;

    fn record(source: &str, brands: &[(&str, &[&str])]) -> BrandModelRecord {
        BrandModelRecord {
            source_id: source.into(),
            brands_models: brands
                .iter()
                .map(|(b, ms)| (b.to_string(), ms.iter().map(|m| m.to_string()).collect()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn summary_counts() {
        let catalog = consolidate(&[
            record("AS24", &[("BMW", &["320i", "X3"]), ("Lada", &["Niva"])]),
            record("CarGurus", &[("BMW", &["M3"]), ("Kia", &["Rio"])]),
        ]);
        let summary = compute_summary(&catalog, &[]);

        assert_eq!(summary.total_brands, 3);
        assert_eq!(summary.total_models, 5);
        assert_eq!(summary.source_brand_counts["AS24"], 2);
        assert_eq!(summary.source_brand_counts["CarGurus"], 2);
        assert_eq!(summary.brands_single_source["AS24"], 1); // Lada
        assert_eq!(summary.brands_single_source["CarGurus"], 1); // Kia
        assert_eq!(summary.brands_multi_source, 1); // BMW
    }

    fn merged(brand: &str, model: &str, fields: &[(SpecCategory, &str)]) -> MergedSpecRecord {
        let mut rec = MergedSpecRecord::new(brand, model);
        for (category, name) in fields {
            rec.scalars.entry(*category).or_default().insert(
                name.to_string(),
                FieldValue {
                    value: "x".into(),
                    source: "AS24".into(),
                    confidence: Confidence::Medium,
                },
            );
        }
        rec
    }

    #[test]
    fn coverage_counts_categories_and_ranks_complete_models() {
        let full = merged(
            "BMW",
            "320i",
            &[
                (SpecCategory::Basic, "fuel_type"),
                (SpecCategory::Performance, "power_hp"),
                (SpecCategory::Dimensions, "weight"),
            ],
        );
        let sparse = merged("Kia", "Rio", &[(SpecCategory::Basic, "fuel_type")]);

        let report = compute_coverage(&[full, sparse], 2);
        assert_eq!(report.total_models, 2);
        assert_eq!(report.category_models["basic"], 2);
        assert_eq!(report.category_models["performance"], 1);
        assert_eq!(report.most_complete.len(), 1);
        assert_eq!(report.most_complete[0].model, "320i");
        assert_eq!(report.most_complete[0].filled_categories, 3);
    }

    #[test]
    fn equipment_counts_as_a_category() {
        let mut rec = merged("BMW", "320i", &[]);
        rec.equipment.insert("ABS".into());
        let report = compute_coverage(&[rec], 1);
        assert_eq!(report.category_models["equipment"], 1);
        assert_eq!(report.most_complete.len(), 1);
    }
}
