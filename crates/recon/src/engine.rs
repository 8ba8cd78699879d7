//! Orchestration: boundary validation of raw source payloads, then
//! consolidation / spec merge over everything that parsed. Partial
//! failure skips only the offending source and is reported as a warning
//! in the result — it never aborts the run.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::MergeConfig;
use crate::derived::compute_derived;
use crate::duplicates::detect_duplicates;
use crate::error::CatalogError;
use crate::evidence::{compute_coverage, compute_summary};
use crate::model::{
    BrandModelRecord, Catalog, ConsolidationResult, CoverageReport, MergedSpecRecord, RunMeta,
    SpecCategory, SpecRecord, Specifications, Warning,
};
use crate::normalize;
use crate::specmerge::merge_specs;

/// Completeness threshold for the coverage report's ranking.
const MIN_COMPLETE_CATEGORIES: usize = 3;

fn meta(config_name: Option<String>) -> RunMeta {
    RunMeta {
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
        config_name,
    }
}

// ---------------------------------------------------------------------------
// Boundary parsing
// ---------------------------------------------------------------------------

fn malformed(source_id: &str, detail: impl Into<String>) -> CatalogError {
    CatalogError::MalformedSource {
        source_id: source_id.to_string(),
        detail: detail.into(),
    }
}

fn payload_source_id(payload: &Value) -> String {
    payload
        .get("source_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

/// Coerce a scalar JSON value to its string form. Containers and null
/// carry no usable value.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Validate one brand/model payload into the normalized record shape.
/// A `brands_models` entry that is not a list fails the whole source —
/// the shape contract is per source, not per brand.
pub fn parse_brand_model_payload(payload: &Value) -> Result<BrandModelRecord, CatalogError> {
    let source_id = payload
        .get("source_id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| malformed("unknown", "missing or empty 'source_id'"))?
        .to_string();

    let brands = payload
        .get("brands_models")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed(&source_id, "'brands_models' is not an object"))?;

    let mut brands_models: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (brand, models_value) in brands {
        let models = models_value.as_array().ok_or_else(|| {
            malformed(
                &source_id,
                format!("'brands_models.{brand}' is not a list"),
            )
        })?;
        // Non-string entries are coerced to string or skipped.
        let models: Vec<String> = models.iter().filter_map(value_to_string).collect();
        brands_models.insert(brand.clone(), models);
    }

    Ok(BrandModelRecord {
        source_id,
        brands_models,
    })
}

/// Validate one technical-spec payload. Unknown categories are kept in
/// the `unclassified` bucket and reported as warnings, never dropped.
pub fn parse_spec_payload(
    payload: &Value,
    warnings: &mut Vec<Warning>,
) -> Result<SpecRecord, CatalogError> {
    let source_id = payload
        .get("source_id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| malformed("unknown", "missing or empty 'source_id'"))?
        .to_string();

    let required_str = |key: &str| -> Result<String, CatalogError> {
        payload
            .get(key)
            .and_then(Value::as_str)
            .and_then(normalize::normalize_model)
            .ok_or_else(|| malformed(&source_id, format!("missing or empty '{key}'")))
    };
    let brand = required_str("brand")?;
    let model = required_str("model")?;

    let confidence = match payload.get("confidence") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            crate::model::Confidence::from_name(s)
                .ok_or_else(|| malformed(&source_id, format!("invalid confidence '{s}'")))?,
        ),
        Some(other) => {
            return Err(malformed(
                &source_id,
                format!("confidence must be a string, got {other}"),
            ))
        }
    };

    let categories = payload
        .get("specifications")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed(&source_id, "'specifications' is not an object"))?;

    let mut specifications = Specifications::default();
    for (name, fields_value) in categories {
        match SpecCategory::from_name(name) {
            Some(SpecCategory::Equipment) => {
                let items = fields_value.as_array().ok_or_else(|| {
                    malformed(&source_id, "'specifications.equipment' is not a list")
                })?;
                specifications.equipment =
                    items.iter().filter_map(value_to_string).collect();
            }
            Some(category) => {
                let fields = fields_value.as_object().ok_or_else(|| {
                    malformed(&source_id, format!("'specifications.{name}' is not an object"))
                })?;
                let parsed: BTreeMap<String, String> = fields
                    .iter()
                    .filter_map(|(k, v)| value_to_string(v).map(|s| (k.clone(), s)))
                    .collect();
                specifications.scalars.insert(category, parsed);
            }
            None => {
                warnings.push(Warning::UnknownCategory {
                    source_id: source_id.clone(),
                    category: name.clone(),
                });
                let Some(fields) = fields_value.as_object() else {
                    continue;
                };
                let parsed: BTreeMap<String, String> = fields
                    .iter()
                    .filter_map(|(k, v)| value_to_string(v).map(|s| (k.clone(), s)))
                    .collect();
                specifications.unclassified.insert(name.clone(), parsed);
            }
        }
    }

    Ok(SpecRecord {
        source_id,
        brand,
        model,
        confidence,
        specifications,
    })
}

// ---------------------------------------------------------------------------
// Consolidation run
// ---------------------------------------------------------------------------

/// Parse every payload, report cross-source duplicates, and merge all
/// surviving sources into `prior` (or an empty catalog). The merge is
/// additive: nothing already in `prior` can disappear.
pub fn run_consolidation(payloads: &[Value], prior: Option<Catalog>) -> ConsolidationResult {
    let mut warnings = Vec::new();
    let mut records: Vec<BrandModelRecord> = Vec::new();

    for payload in payloads {
        match parse_brand_model_payload(payload) {
            Ok(record) => records.push(record),
            Err(CatalogError::MalformedSource { source_id, detail }) => {
                warnings.push(Warning::MalformedSource { source_id, detail });
            }
            Err(other) => {
                warnings.push(Warning::MalformedSource {
                    source_id: payload_source_id(payload),
                    detail: other.to_string(),
                });
            }
        }
    }

    // Duplicates: each source's brands checked against the sources that
    // came before it in caller order. Audit output only — the union in
    // the catalog already handles the overlap.
    let mut duplicates = Vec::new();
    for (i, record) in records.iter().enumerate() {
        for (brand, models) in &record.brands_models {
            duplicates.extend(detect_duplicates(
                brand,
                models,
                &record.source_id,
                &records[..i],
            ));
        }
    }

    let mut catalog = prior.unwrap_or_default();
    for record in &records {
        catalog.merge_record(record);
    }

    let summary = compute_summary(&catalog, &duplicates);

    ConsolidationResult {
        meta: meta(None),
        summary,
        catalog,
        duplicates,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Spec merge run
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SpecMergeRun {
    pub meta: RunMeta,
    pub records: Vec<MergedSpecRecord>,
    pub coverage: CoverageReport,
    pub warnings: Vec<Warning>,
}

impl SpecMergeRun {
    /// Full JSON rendering: merged records in the external contract
    /// shape (with `_provenance` and `derived`), coverage, warnings.
    pub fn to_json(&self) -> Value {
        let records: Vec<Value> = self
            .records
            .iter()
            .map(|r| r.to_output(compute_derived(r).as_ref()))
            .collect();
        serde_json::json!({
            "meta": self.meta,
            "records": records,
            "coverage": self.coverage,
            "warnings": self.warnings,
        })
    }
}

/// Parse every spec payload, group observations per (brand, model), and
/// merge each group under the configured policy.
pub fn run_spec_merge(payloads: &[Value], config: &MergeConfig) -> SpecMergeRun {
    let mut warnings = Vec::new();
    let mut records: Vec<SpecRecord> = Vec::new();

    for payload in payloads {
        match parse_spec_payload(payload, &mut warnings) {
            Ok(record) => records.push(record),
            Err(CatalogError::MalformedSource { source_id, detail }) => {
                warnings.push(Warning::MalformedSource { source_id, detail });
            }
            Err(other) => {
                warnings.push(Warning::MalformedSource {
                    source_id: payload_source_id(payload),
                    detail: other.to_string(),
                });
            }
        }
    }

    // Group by identity key, remembering first-seen display names.
    let mut groups: BTreeMap<(String, String), (String, String, Vec<SpecRecord>)> =
        BTreeMap::new();
    for record in records {
        let key = (
            normalize::brand_key(&record.brand),
            record.model.to_lowercase(),
        );
        let group = groups
            .entry(key)
            .or_insert_with(|| (record.brand.clone(), record.model.clone(), Vec::new()));
        group.2.push(record);
    }

    let merged: Vec<MergedSpecRecord> = groups
        .into_values()
        .map(|(brand, model, group)| merge_specs(&brand, &model, &group, config))
        .collect();

    let coverage = compute_coverage(&merged, MIN_COMPLETE_CATEGORIES);

    SpecMergeRun {
        meta: meta(Some(config.name.clone())),
        records: merged,
        coverage,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
