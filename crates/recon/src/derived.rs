//! Derived-Metrics Calculator — secondary attributes computed from a
//! fully merged record. Missing or unparseable inputs yield `None`,
//! never a fabricated default.

use crate::model::{DerivedMetrics, MergedSpecRecord, SpecCategory};

/// Rough empirical drag constant for the top-speed heuristic.
const AERO_COEFF: f64 = 0.3;

/// Heuristic bounds — the formula is not a physics simulation and must
/// not produce absurd values.
const TOP_SPEED_MIN_KMH: i32 = 140;
const TOP_SPEED_MAX_KMH: i32 = 350;

/// Parse the leading numeric portion of a field value, dropping unit
/// suffixes like "hp", "kg", "mm".
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-'))
        .last()
        .map(|(i, c)| i + c.len_utf8())?;
    trimmed[..end].parse().ok()
}

/// Compute derived metrics for a merged record. Requires
/// `performance.power_hp` and `dimensions.weight` to be present and
/// parseable; returns `None` otherwise.
pub fn compute_derived(record: &MergedSpecRecord) -> Option<DerivedMetrics> {
    let power_hp = record
        .field(SpecCategory::Performance, "power_hp")
        .and_then(|fv| parse_numeric(&fv.value))?;
    let weight_kg = record
        .field(SpecCategory::Dimensions, "weight")
        .and_then(|fv| parse_numeric(&fv.value))?;

    if power_hp <= 0.0 || weight_kg <= 0.0 {
        return None;
    }

    let power_to_weight_ratio = (power_hp / weight_kg * 1000.0 * 100.0).round() / 100.0;

    let raw_speed = ((power_hp * 1000.0) / (AERO_COEFF * weight_kg)).sqrt() as i32;
    let estimated_top_speed_kmh = raw_speed.clamp(TOP_SPEED_MIN_KMH, TOP_SPEED_MAX_KMH);

    Some(DerivedMetrics {
        power_to_weight_ratio,
        estimated_top_speed_kmh,
        fuel_efficiency_category: fuel_efficiency_category(record).to_string(),
    })
}

/// Four-way efficiency class from `basic.fuel_type` string containment,
/// case-insensitive. Missing fuel type falls through to gasoline.
fn fuel_efficiency_category(record: &MergedSpecRecord) -> &'static str {
    let fuel_type = record
        .field(SpecCategory::Basic, "fuel_type")
        .map(|fv| fv.value.to_lowercase())
        .unwrap_or_default();

    if fuel_type.contains("electr") || fuel_type.contains("élect") {
        "A+++ (Electric)"
    } else if fuel_type.contains("hybrid") {
        "A+ (Hybrid)"
    } else if fuel_type.contains("diesel") {
        "B (Diesel)"
    } else {
        "C (Gasoline)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Confidence, FieldValue};

    fn record(fields: &[(SpecCategory, &str, &str)]) -> MergedSpecRecord {
        let mut rec = MergedSpecRecord::new("BMW", "320i");
        for (category, name, value) in fields {
            rec.scalars.entry(*category).or_default().insert(
                name.to_string(),
                FieldValue {
                    value: value.to_string(),
                    source: "Auto-Data".into(),
                    confidence: Confidence::Medium,
                },
            );
        }
        rec
    }

    #[test]
    fn parse_numeric_strips_units() {
        assert_eq!(parse_numeric("184"), Some(184.0));
        assert_eq!(parse_numeric("1500kg"), Some(1500.0));
        assert_eq!(parse_numeric(" 184 hp"), Some(184.0));
        assert_eq!(parse_numeric("4.5s"), Some(4.5));
        assert_eq!(parse_numeric("kg"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn power_to_weight_and_speed() {
        let rec = record(&[
            (SpecCategory::Performance, "power_hp", "200"),
            (SpecCategory::Dimensions, "weight", "1500kg"),
        ]);
        let metrics = compute_derived(&rec).unwrap();
        assert_eq!(metrics.power_to_weight_ratio, 133.33);
        assert!(metrics.estimated_top_speed_kmh >= 140);
        assert!(metrics.estimated_top_speed_kmh <= 350);
    }

    #[test]
    fn missing_weight_yields_none() {
        let rec = record(&[(SpecCategory::Performance, "power_hp", "200")]);
        assert_eq!(compute_derived(&rec), None);
    }

    #[test]
    fn unparseable_power_yields_none() {
        let rec = record(&[
            (SpecCategory::Performance, "power_hp", "unknown"),
            (SpecCategory::Dimensions, "weight", "1500kg"),
        ]);
        assert_eq!(compute_derived(&rec), None);
    }

    #[test]
    fn zero_weight_yields_none() {
        let rec = record(&[
            (SpecCategory::Performance, "power_hp", "200"),
            (SpecCategory::Dimensions, "weight", "0kg"),
        ]);
        assert_eq!(compute_derived(&rec), None);
    }

    #[test]
    fn speed_is_clamped_low() {
        // Weak engine in a heavy car: raw formula lands below the floor.
        let rec = record(&[
            (SpecCategory::Performance, "power_hp", "10"),
            (SpecCategory::Dimensions, "weight", "2500kg"),
        ]);
        let metrics = compute_derived(&rec).unwrap();
        assert_eq!(metrics.estimated_top_speed_kmh, 140);
    }

    #[test]
    fn speed_is_clamped_high() {
        let rec = record(&[
            (SpecCategory::Performance, "power_hp", "2000"),
            (SpecCategory::Dimensions, "weight", "10kg"),
        ]);
        let metrics = compute_derived(&rec).unwrap();
        assert_eq!(metrics.estimated_top_speed_kmh, 350);
    }

    #[test]
    fn fuel_categories() {
        let cases = [
            ("Electric", "A+++ (Electric)"),
            ("Plug-in Hybrid", "A+ (Hybrid)"),
            ("diesel", "B (Diesel)"),
            ("Gasoline", "C (Gasoline)"),
        ];
        for (fuel, expected) in cases {
            let rec = record(&[
                (SpecCategory::Performance, "power_hp", "100"),
                (SpecCategory::Dimensions, "weight", "1400"),
                (SpecCategory::Basic, "fuel_type", fuel),
            ]);
            let metrics = compute_derived(&rec).unwrap();
            assert_eq!(metrics.fuel_efficiency_category, expected, "fuel={fuel}");
        }
    }

    #[test]
    fn missing_fuel_type_defaults_to_gasoline() {
        let rec = record(&[
            (SpecCategory::Performance, "power_hp", "100"),
            (SpecCategory::Dimensions, "weight", "1400"),
        ]);
        let metrics = compute_derived(&rec).unwrap();
        assert_eq!(metrics.fuel_efficiency_category, "C (Gasoline)");
    }
}
