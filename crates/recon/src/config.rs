use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::CatalogError;
use crate::model::Confidence;

// ---------------------------------------------------------------------------
// Merge policy config
// ---------------------------------------------------------------------------

/// Deployment-specific merge policy: source priority ordering and
/// per-source default confidence. The priority order is the tiebreak
/// when two observations carry equal confidence for the same field.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    pub name: String,
    /// Highest priority first. Sources not listed rank below all listed
    /// ones and tie among themselves (first-seen wins).
    #[serde(default)]
    pub priority: Vec<String>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsConfig {
    /// Confidence assumed when a source supplies none.
    #[serde(default)]
    pub confidence: Confidence,
    /// Per-source overrides, e.g. a synthetic-spec generator pinned to
    /// `low` so any real observation outranks it.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceDefaults>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceDefaults {
    pub confidence: Confidence,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            priority: Vec::new(),
            defaults: DefaultsConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, CatalogError> {
        let config: MergeConfig =
            toml::from_str(input).map_err(|e| CatalogError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::ConfigValidation("name must not be empty".into()));
        }

        for (i, source) in self.priority.iter().enumerate() {
            if source.trim().is_empty() {
                return Err(CatalogError::ConfigValidation(
                    "priority entries must not be empty".into(),
                ));
            }
            if self.priority[..i].contains(source) {
                return Err(CatalogError::ConfigValidation(format!(
                    "duplicate priority entry: '{source}'"
                )));
            }
        }

        Ok(())
    }

    /// Rank of a source in the priority order; lower wins. Unlisted
    /// sources share the rank just past the end of the list.
    pub fn rank(&self, source: &str) -> usize {
        self.priority
            .iter()
            .position(|s| s == source)
            .unwrap_or(self.priority.len())
    }

    /// Default confidence for a source's observations that carry none.
    pub fn default_confidence(&self, source: &str) -> Confidence {
        self.defaults
            .sources
            .get(source)
            .map(|s| s.confidence)
            .unwrap_or(self.defaults.confidence)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "production"
priority = ["Auto-Data", "Carfolio", "AS24", "CarGurus", "Generated"]

[defaults]
confidence = "medium"

[defaults.sources.Generated]
confidence = "low"
"#;

    #[test]
    fn parse_valid() {
        let config = MergeConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "production");
        assert_eq!(config.priority.len(), 5);
        assert_eq!(config.rank("Auto-Data"), 0);
        assert_eq!(config.rank("CarGurus"), 3);
        assert_eq!(config.default_confidence("AS24"), Confidence::Medium);
        assert_eq!(config.default_confidence("Generated"), Confidence::Low);
    }

    #[test]
    fn unlisted_source_ranks_last() {
        let config = MergeConfig::from_toml(VALID).unwrap();
        assert_eq!(config.rank("Mystery"), 5);
        assert_eq!(config.rank("Other"), config.rank("Mystery"));
    }

    #[test]
    fn reject_duplicate_priority_entry() {
        let input = r#"
name = "bad"
priority = ["AS24", "AS24"]
"#;
        let err = MergeConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate priority entry"));
    }

    #[test]
    fn reject_empty_name() {
        let err = MergeConfig::from_toml(r#"name = """#).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn reject_invalid_confidence() {
        let input = r#"
name = "bad"

[defaults]
confidence = "certain"
"#;
        assert!(MergeConfig::from_toml(input).is_err());
    }

    #[test]
    fn defaults_when_sections_absent() {
        let config = MergeConfig::from_toml(r#"name = "minimal""#).unwrap();
        assert!(config.priority.is_empty());
        assert_eq!(config.default_confidence("anything"), Confidence::Medium);
    }
}
