//! Specification Merger — combines per-field attribute observations from
//! multiple sources into one record per (brand, model).
//!
//! Field resolution order:
//! 1. presence — an empty or "N/A" value never overwrites a recorded one
//! 2. confidence — high > medium > low
//! 3. source priority — configured ordering, lower rank wins
//! 4. stability — first-seen value is kept on a full tie
//!
//! Equipment lists merge by set union. Unrecognized categories are kept
//! under an `unclassified` bucket with the same field policy.

use crate::config::MergeConfig;
use crate::model::{
    Confidence, FieldValue, MergedSpecRecord, SpecCategory, SpecObservation, SpecRecord,
};

/// True for values the merger treats as "no information".
fn is_absent(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a")
}

/// Decide whether `incoming` replaces `current` under the merge policy.
fn wins_over(incoming: &FieldValue, current: &FieldValue, config: &MergeConfig) -> bool {
    if incoming.confidence != current.confidence {
        return incoming.confidence > current.confidence;
    }
    // Equal confidence: configured source priority, then first-seen.
    config.rank(&incoming.source) < config.rank(&current.source)
}

fn absorb_field(
    fields: &mut std::collections::BTreeMap<String, FieldValue>,
    name: &str,
    incoming: FieldValue,
    config: &MergeConfig,
) {
    if is_absent(&incoming.value) {
        return;
    }
    match fields.get(name) {
        Some(current) if !wins_over(&incoming, current, config) => {}
        _ => {
            fields.insert(name.to_string(), incoming);
        }
    }
}

impl MergedSpecRecord {
    /// Merge one scalar observation under the field policy.
    pub fn absorb_observation(&mut self, obs: &SpecObservation, config: &MergeConfig) {
        let fields = self.scalars.entry(obs.category).or_default();
        absorb_field(
            fields,
            &obs.field,
            FieldValue {
                value: obs.value.trim().to_string(),
                source: obs.source_id.clone(),
                confidence: obs.confidence,
            },
            config,
        );
    }

    /// Merge one full source record: scalar categories, equipment union,
    /// unclassified leftovers.
    pub fn absorb_record(&mut self, record: &SpecRecord, config: &MergeConfig) {
        let confidence = record
            .confidence
            .unwrap_or_else(|| config.default_confidence(&record.source_id));

        for (&category, fields) in &record.specifications.scalars {
            for (name, value) in fields {
                self.absorb_observation(
                    &SpecObservation {
                        source_id: record.source_id.clone(),
                        category,
                        field: name.clone(),
                        value: value.clone(),
                        confidence,
                    },
                    config,
                );
            }
        }

        // Equipment is additive by nature: one source's silence does not
        // contradict another source's reported feature.
        for item in &record.specifications.equipment {
            let trimmed = item.trim();
            if !trimmed.is_empty() {
                self.equipment.insert(trimmed.to_string());
            }
        }

        for (category, fields) in &record.specifications.unclassified {
            let bucket = self.unclassified.entry(category.clone()).or_default();
            for (name, value) in fields {
                absorb_field(
                    bucket,
                    name,
                    FieldValue {
                        value: value.trim().to_string(),
                        source: record.source_id.clone(),
                        confidence,
                    },
                    config,
                );
            }
        }
    }
}

/// Merge all observations for one (brand, model) into a single record.
/// Records for other (brand, model) pairs are the caller's concern;
/// see [`crate::engine::run_spec_merge`] for the grouped entry point.
pub fn merge_specs(
    brand: &str,
    model: &str,
    records: &[SpecRecord],
    config: &MergeConfig,
) -> MergedSpecRecord {
    let mut merged = MergedSpecRecord::new(brand, model);
    for record in records {
        merged.absorb_record(record, config);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Specifications;
    use std::collections::BTreeMap;

    fn config() -> MergeConfig {
        MergeConfig::from_toml(
            r#"
name = "test"
priority = ["Auto-Data", "Carfolio", "AS24"]

[defaults.sources.Generated]
confidence = "low"
"#,
        )
        .unwrap()
    }

    fn record(source: &str, confidence: Option<Confidence>) -> SpecRecord {
        SpecRecord {
            source_id: source.into(),
            brand: "BMW".into(),
            model: "320i".into(),
            confidence,
            specifications: Specifications::default(),
        }
    }

    fn with_field(
        mut rec: SpecRecord,
        category: SpecCategory,
        field: &str,
        value: &str,
    ) -> SpecRecord {
        rec.specifications
            .scalars
            .entry(category)
            .or_default()
            .insert(field.into(), value.into());
        rec
    }

    #[test]
    fn empty_value_never_overwrites() {
        let first = with_field(
            record("Auto-Data", Some(Confidence::Medium)),
            SpecCategory::Performance,
            "power_hp",
            "184",
        );
        let second = with_field(
            record("Carfolio", Some(Confidence::Low)),
            SpecCategory::Performance,
            "power_hp",
            "",
        );
        let merged = merge_specs("BMW", "320i", &[first, second], &config());
        assert_eq!(
            merged.field(SpecCategory::Performance, "power_hp").unwrap().value,
            "184"
        );
    }

    #[test]
    fn na_placeholder_is_treated_as_absent() {
        let first = with_field(
            record("Auto-Data", None),
            SpecCategory::Engine,
            "displacement",
            "1998cm3",
        );
        let second = with_field(
            record("Carfolio", Some(Confidence::High)),
            SpecCategory::Engine,
            "displacement",
            "N/A",
        );
        let merged = merge_specs("BMW", "320i", &[first, second], &config());
        assert_eq!(
            merged.field(SpecCategory::Engine, "displacement").unwrap().value,
            "1998cm3"
        );
    }

    #[test]
    fn higher_confidence_wins_regardless_of_order() {
        let low = with_field(
            record("Auto-Data", Some(Confidence::Low)),
            SpecCategory::Performance,
            "power_hp",
            "150",
        );
        let high = with_field(
            record("CarGurus", Some(Confidence::High)),
            SpecCategory::Performance,
            "power_hp",
            "184",
        );

        for records in [vec![low.clone(), high.clone()], vec![high, low]] {
            let merged = merge_specs("BMW", "320i", &records, &config());
            let fv = merged.field(SpecCategory::Performance, "power_hp").unwrap();
            assert_eq!(fv.value, "184");
            assert_eq!(fv.source, "CarGurus");
            assert_eq!(fv.confidence, Confidence::High);
        }
    }

    #[test]
    fn source_priority_breaks_confidence_ties() {
        let lower = with_field(
            record("Carfolio", Some(Confidence::Medium)),
            SpecCategory::Engine,
            "displacement",
            "1997cm3",
        );
        let higher = with_field(
            record("Auto-Data", Some(Confidence::Medium)),
            SpecCategory::Engine,
            "displacement",
            "1998cm3",
        );

        for records in [vec![lower.clone(), higher.clone()], vec![higher, lower]] {
            let merged = merge_specs("BMW", "320i", &records, &config());
            let fv = merged.field(SpecCategory::Engine, "displacement").unwrap();
            assert_eq!(fv.value, "1998cm3");
            assert_eq!(fv.source, "Auto-Data");
        }
    }

    #[test]
    fn full_tie_keeps_first_seen() {
        let a = with_field(
            record("Mystery1", Some(Confidence::Medium)),
            SpecCategory::Basic,
            "fuel_type",
            "Gasoline",
        );
        let b = with_field(
            record("Mystery2", Some(Confidence::Medium)),
            SpecCategory::Basic,
            "fuel_type",
            "Diesel",
        );
        let merged = merge_specs("BMW", "320i", &[a, b], &config());
        assert_eq!(
            merged.field(SpecCategory::Basic, "fuel_type").unwrap().value,
            "Gasoline"
        );
    }

    #[test]
    fn remerge_is_idempotent() {
        let records = vec![
            with_field(
                record("Auto-Data", None),
                SpecCategory::Performance,
                "power_hp",
                "184",
            ),
            with_field(
                record("AS24", Some(Confidence::High)),
                SpecCategory::Dimensions,
                "weight",
                "1500kg",
            ),
        ];
        let once = merge_specs("BMW", "320i", &records, &config());
        let doubled: Vec<_> = records.iter().cloned().chain(records.clone()).collect();
        let twice = merge_specs("BMW", "320i", &doubled, &config());
        assert_eq!(once, twice);
    }

    #[test]
    fn equipment_merges_by_union() {
        let mut a = record("AS24", None);
        a.specifications.equipment = vec!["ABS".into(), "Airbags".into()];
        let mut b = record("Carfolio", None);
        b.specifications.equipment = vec!["Airbags".into(), "Cruise control".into(), " ".into()];
        let merged = merge_specs("BMW", "320i", &[a, b], &config());
        assert_eq!(
            merged.equipment.iter().collect::<Vec<_>>(),
            vec!["ABS", "Airbags", "Cruise control"]
        );
    }

    #[test]
    fn unclassified_bucket_preserves_unknown_categories() {
        let mut rec = record("Carfolio", None);
        rec.specifications.unclassified.insert(
            "safety".into(),
            BTreeMap::from([("euroncap".into(), "5 stars".into())]),
        );
        let merged = merge_specs("BMW", "320i", &[rec], &config());
        assert_eq!(
            merged.unclassified["safety"]["euroncap"].value,
            "5 stars"
        );
    }

    #[test]
    fn generated_source_defaults_low_and_loses_to_real_data() {
        let generated = with_field(
            record("Generated", None),
            SpecCategory::Performance,
            "power_hp",
            "150",
        );
        let real = with_field(
            record("CarGurus", None), // defaults medium
            SpecCategory::Performance,
            "power_hp",
            "184",
        );
        let merged = merge_specs("BMW", "320i", &[generated, real], &config());
        assert_eq!(
            merged.field(SpecCategory::Performance, "power_hp").unwrap().source,
            "CarGurus"
        );
    }

    #[test]
    fn provenance_records_winner() {
        let a = with_field(
            record("Auto-Data", Some(Confidence::Medium)),
            SpecCategory::Engine,
            "displacement",
            "1998cm3",
        );
        let b = with_field(
            record("Carfolio", Some(Confidence::Medium)),
            SpecCategory::Engine,
            "displacement",
            "1997cm3",
        );
        let merged = merge_specs("BMW", "320i", &[b, a], &config());
        let output = merged.to_output(None);
        assert_eq!(
            output["_provenance"]["engine.displacement"]["source"],
            "Auto-Data"
        );
        assert_eq!(
            output["_provenance"]["engine.displacement"]["confidence"],
            "medium"
        );
    }
}
