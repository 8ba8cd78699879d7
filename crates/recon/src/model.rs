use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::normalize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One source's brand→models payload from a single scrape run,
/// already validated into the normalized shape.
#[derive(Debug, Clone, Serialize)]
pub struct BrandModelRecord {
    pub source_id: String,
    pub brands_models: BTreeMap<String, Vec<String>>,
}

/// Confidence a source attaches to its observations.
/// Ordering matters: `High` beats `Medium` beats `Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl Confidence {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// The fixed set of recognized specification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecCategory {
    Basic,
    Performance,
    Dimensions,
    Engine,
    Transmission,
    Equipment,
}

impl SpecCategory {
    /// Categories whose fields are scalar string values (everything but equipment).
    pub const SCALAR: [SpecCategory; 5] = [
        Self::Basic,
        Self::Performance,
        Self::Dimensions,
        Self::Engine,
        Self::Transmission,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "basic" => Some(Self::Basic),
            "performance" => Some(Self::Performance),
            "dimensions" => Some(Self::Dimensions),
            "engine" => Some(Self::Engine),
            "transmission" => Some(Self::Transmission),
            "equipment" => Some(Self::Equipment),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpecCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Performance => write!(f, "performance"),
            Self::Dimensions => write!(f, "dimensions"),
            Self::Engine => write!(f, "engine"),
            Self::Transmission => write!(f, "transmission"),
            Self::Equipment => write!(f, "equipment"),
        }
    }
}

/// Category-grouped attribute claims inside one [`SpecRecord`].
///
/// Unrecognized categories land in `unclassified` keyed by their original
/// name — never silently dropped.
#[derive(Debug, Clone, Default)]
pub struct Specifications {
    pub scalars: BTreeMap<SpecCategory, BTreeMap<String, String>>,
    pub equipment: Vec<String>,
    pub unclassified: BTreeMap<String, BTreeMap<String, String>>,
}

/// One source's technical-spec claim about one (brand, model).
#[derive(Debug, Clone)]
pub struct SpecRecord {
    pub source_id: String,
    pub brand: String,
    pub model: String,
    /// `None` means "use the merge config's default for this source".
    pub confidence: Option<Confidence>,
    pub specifications: Specifications,
}

/// A single scalar field claim, flattened out of a [`SpecRecord`].
#[derive(Debug, Clone)]
pub struct SpecObservation {
    pub source_id: String,
    pub category: SpecCategory,
    pub field: String,
    pub value: String,
    pub confidence: Confidence,
}

// ---------------------------------------------------------------------------
// Consolidated catalog
// ---------------------------------------------------------------------------

/// One brand's consolidated entry: every source that reported it and the
/// union of all reported models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedEntry {
    /// Brand name as first seen (case preserved for display).
    pub display_name: String,
    pub sources: BTreeSet<String>,
    /// Normalized model names. BTreeSet keeps them sorted and deduplicated.
    pub models: BTreeSet<String>,
}

impl ConsolidatedEntry {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            sources: BTreeSet::new(),
            models: BTreeSet::new(),
        }
    }

    /// Derived, never stored — recomputed on read to avoid drift.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}

/// The additive brand/model catalog. Entries are keyed case-insensitively;
/// the only mutation path is merging in new source records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub(crate) entries: BTreeMap<String, ConsolidatedEntry>,
}

impl Catalog {
    pub fn get(&self, brand: &str) -> Option<&ConsolidatedEntry> {
        self.entries.get(&normalize::brand_key(brand))
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConsolidatedEntry> {
        self.entries.values()
    }

    pub fn brand_count(&self) -> usize {
        self.entries.len()
    }

    pub fn total_model_count(&self) -> usize {
        self.entries.values().map(|e| e.models.len()).sum()
    }

    /// True when `other`'s brands and models are all present here.
    pub fn contains_all_of(&self, other: &Catalog) -> bool {
        other.entries.iter().all(|(key, entry)| {
            self.entries
                .get(key)
                .is_some_and(|mine| entry.models.is_subset(&mine.models))
        })
    }
}

/// Serialized shape of one catalog entry. Part of the file contract:
/// downstream consumers read catalogs in this form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryView {
    pub sources: Vec<String>,
    pub models: Vec<String>,
    pub model_count: usize,
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in self.entries.values() {
            let view = EntryView {
                sources: entry.sources.iter().cloned().collect(),
                models: entry.models.iter().cloned().collect(),
                model_count: entry.model_count(),
            };
            map.serialize_entry(&entry.display_name, &view)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let views = BTreeMap::<String, EntryView>::deserialize(deserializer)?;
        let mut catalog = Catalog::default();
        for (display_name, view) in views {
            let key = normalize::brand_key(&display_name);
            let mut entry = ConsolidatedEntry::new(display_name);
            entry.sources.extend(view.sources);
            // model_count is derived; the stored value is ignored on load
            for model in view.models {
                if let Some(normalized) = normalize::normalize_model(&model) {
                    entry.models.insert(normalized);
                }
            }
            catalog.entries.insert(key, entry);
        }
        Ok(catalog)
    }
}

/// An observation that a (brand, model) was reported by more than one
/// source. Informational only — the union already dedupes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    pub brand: String,
    pub model: String,
    pub existing_source: String,
    pub new_source: String,
}

// ---------------------------------------------------------------------------
// Merged specifications
// ---------------------------------------------------------------------------

/// A winning field value plus the provenance needed to audit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub value: String,
    pub source: String,
    pub confidence: Confidence,
}

/// The merged specification record for one (brand, model): winning value
/// per (category, field), union of equipment, unclassified leftovers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedSpecRecord {
    pub brand: String,
    pub model: String,
    pub scalars: BTreeMap<SpecCategory, BTreeMap<String, FieldValue>>,
    pub equipment: BTreeSet<String>,
    pub unclassified: BTreeMap<String, BTreeMap<String, FieldValue>>,
}

impl MergedSpecRecord {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn field(&self, category: SpecCategory, field: &str) -> Option<&FieldValue> {
        self.scalars.get(&category).and_then(|fields| fields.get(field))
    }

    /// Number of recognized categories carrying at least one value.
    pub fn filled_categories(&self) -> usize {
        let scalar = self.scalars.values().filter(|f| !f.is_empty()).count();
        scalar + usize::from(!self.equipment.is_empty())
    }

    /// Render to the external contract shape: category maps with plain
    /// values, `_provenance` keyed by `category.field`, and an optional
    /// `derived` block supplied by the caller.
    pub fn to_output(&self, derived: Option<&DerivedMetrics>) -> Value {
        let mut root = serde_json::Map::new();
        root.insert("brand".into(), json!(self.brand));
        root.insert("model".into(), json!(self.model));

        let mut provenance = serde_json::Map::new();
        let mut specifications = serde_json::Map::new();

        for category in SpecCategory::SCALAR {
            let mut fields = serde_json::Map::new();
            if let Some(values) = self.scalars.get(&category) {
                for (name, fv) in values {
                    fields.insert(name.clone(), json!(fv.value));
                    provenance.insert(
                        format!("{category}.{name}"),
                        json!({ "source": fv.source, "confidence": fv.confidence }),
                    );
                }
            }
            specifications.insert(category.to_string(), Value::Object(fields));
        }
        specifications.insert(
            "equipment".into(),
            json!(self.equipment.iter().collect::<Vec<_>>()),
        );

        if !self.unclassified.is_empty() {
            let mut unclassified = serde_json::Map::new();
            for (category, values) in &self.unclassified {
                let mut fields = serde_json::Map::new();
                for (name, fv) in values {
                    fields.insert(name.clone(), json!(fv.value));
                    provenance.insert(
                        format!("{category}.{name}"),
                        json!({ "source": fv.source, "confidence": fv.confidence }),
                    );
                }
                unclassified.insert(category.clone(), Value::Object(fields));
            }
            specifications.insert("unclassified".into(), Value::Object(unclassified));
        }

        root.insert("specifications".into(), Value::Object(specifications));
        root.insert("_provenance".into(), Value::Object(provenance));
        if let Some(metrics) = derived {
            root.insert("derived".into(), json!(metrics));
        }
        Value::Object(root)
    }
}

/// Secondary attributes computed from a fully merged record.
/// Never persisted independently of the record that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    /// hp per tonne, rounded to 2 decimals.
    pub power_to_weight_ratio: f64,
    pub estimated_top_speed_kmh: i32,
    pub fuel_efficiency_category: String,
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Recoverable per-source problems. Carried as data in results so the
/// engine stays pure; the caller decides how to surface them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A source payload did not match the expected shape and was skipped.
    MalformedSource { source_id: String, detail: String },
    /// An observation used a category outside the recognized six; its
    /// fields were preserved under `unclassified`.
    UnknownCategory { source_id: String, category: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedSource { source_id, detail } => {
                write!(f, "source '{source_id}' skipped: {detail}")
            }
            Self::UnknownCategory { source_id, category } => {
                write!(f, "source '{source_id}': unknown category '{category}' kept as unclassified")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// Consolidation statistics: how the catalog breaks down across sources.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationSummary {
    pub total_brands: usize,
    pub total_models: usize,
    /// Brands each source reported (including brands shared with others).
    pub source_brand_counts: BTreeMap<String, usize>,
    /// Brands reported by exactly one source, per source.
    pub brands_single_source: BTreeMap<String, usize>,
    /// Brands reported by two or more sources.
    pub brands_multi_source: usize,
    pub duplicate_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationResult {
    pub meta: RunMeta,
    pub summary: ConsolidationSummary,
    pub catalog: Catalog,
    pub duplicates: Vec<DuplicateRecord>,
    pub warnings: Vec<Warning>,
}

/// Per-category coverage over a set of merged records.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub total_models: usize,
    /// Models carrying at least one field, per category name.
    pub category_models: BTreeMap<String, usize>,
    /// Models meeting the completeness threshold, most complete first.
    pub most_complete: Vec<ModelCompleteness>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelCompleteness {
    pub brand: String,
    pub model: String,
    pub filled_categories: usize,
}
