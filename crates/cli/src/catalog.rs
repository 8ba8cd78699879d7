//! `cardex consolidate` / `cardex duplicates` — brand/model catalog commands.

use std::path::PathBuf;

use cardex_recon::engine::parse_brand_model_payload;
use cardex_recon::model::DuplicateRecord;
use cardex_recon::{duplicates, run_consolidation, Catalog};

use crate::exit_codes::EXIT_DUPLICATES_FOUND;
use crate::{load_json, load_payloads, CliError};

pub fn cmd_consolidate(
    sources: Vec<PathBuf>,
    prior: Option<PathBuf>,
    json_output: bool,
    output_file: Option<PathBuf>,
    csv_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let payloads = load_payloads(&sources)?;

    let prior_catalog = match prior {
        Some(ref path) => {
            let value = load_json(path)?;
            let catalog: Catalog = serde_json::from_value(value)
                .map_err(|e| CliError::parse(format!("{}: not a catalog: {e}", path.display())))?;
            Some(catalog)
        }
        None => None,
    };

    let result = run_consolidation(&payloads, prior_catalog);

    for warning in &result.warnings {
        eprintln!("warning: {warning}");
    }

    if let Some(ref path) = output_file {
        let catalog_json = serde_json::to_string_pretty(&result.catalog)
            .map_err(|e| CliError::parse(format!("JSON serialization error: {e}")))?;
        std::fs::write(path, catalog_json)
            .map_err(|e| CliError::args(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = csv_file {
        write_catalog_csv(path, &result.catalog)?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::parse(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "consolidated {} brand(s), {} model(s) from {} source(s) — {} multi-source, {} duplicate pair(s), {} warning(s)",
        s.total_brands,
        s.total_models,
        sources.len(),
        s.brands_multi_source,
        s.duplicate_count,
        result.warnings.len(),
    );

    Ok(())
}

pub fn cmd_duplicates(
    candidate_path: PathBuf,
    against: Vec<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let candidate = parse_brand_model_payload(&load_json(&candidate_path)?)
        .map_err(|e| CliError::parse(format!("{}: {e}", candidate_path.display())))?;

    let mut existing = Vec::with_capacity(against.len());
    for path in &against {
        let record = parse_brand_model_payload(&load_json(path)?)
            .map_err(|e| CliError::parse(format!("{}: {e}", path.display())))?;
        existing.push(record);
    }

    let mut found: Vec<DuplicateRecord> = Vec::new();
    for (brand, models) in &candidate.brands_models {
        found.extend(duplicates::detect_duplicates(
            brand,
            models,
            &candidate.source_id,
            &existing,
        ));
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&found)
            .map_err(|e| CliError::parse(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for dup in &found {
            println!(
                "{} {} — already listed by {} (candidate: {})",
                dup.brand, dup.model, dup.existing_source, dup.new_source,
            );
        }
    }

    eprintln!(
        "{}: {} overlap(s) against {} existing source(s)",
        candidate.source_id,
        found.len(),
        existing.len(),
    );

    if found.is_empty() {
        Ok(())
    } else {
        // Overlap is a signal, not a failure; message already printed.
        Err(CliError {
            code: EXIT_DUPLICATES_FOUND,
            message: String::new(),
            hint: None,
        })
    }
}

/// One CSV row per brand: name, counts, then `;`-joined lists.
fn catalog_csv_rows(catalog: &Catalog) -> Vec<[String; 4]> {
    catalog
        .entries()
        .map(|entry| {
            [
                entry.display_name.clone(),
                entry.model_count().to_string(),
                entry.sources.iter().cloned().collect::<Vec<_>>().join(";"),
                entry.models.iter().cloned().collect::<Vec<_>>().join(";"),
            ]
        })
        .collect()
}

fn write_catalog_csv(path: &std::path::Path, catalog: &Catalog) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| CliError::args(format!("cannot write {}: {e}", path.display())))?;
    writer
        .write_record(["brand", "model_count", "sources", "models"])
        .map_err(|e| CliError::args(format!("CSV write error: {e}")))?;
    for row in catalog_csv_rows(catalog) {
        writer
            .write_record(&row)
            .map_err(|e| CliError::args(format!("CSV write error: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| CliError::args(format!("CSV write error: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_csv_rows_join_lists() {
        let result = run_consolidation(
            &[
                json!({ "source_id": "AS24", "brands_models": { "BMW": ["320i", "X3"] } }),
                json!({ "source_id": "CarGurus", "brands_models": { "BMW": ["M3"] } }),
            ],
            None,
        );
        let rows = catalog_csv_rows(&result.catalog);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "BMW");
        assert_eq!(rows[0][1], "3");
        assert_eq!(rows[0][2], "AS24;CarGurus");
        assert_eq!(rows[0][3], "320i;M3;X3");
    }

    #[test]
    fn write_catalog_csv_emits_header_and_rows() {
        let result = run_consolidation(
            &[json!({ "source_id": "AS24", "brands_models": { "Lada": ["Niva"] } })],
            None,
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        write_catalog_csv(&path, &result.catalog).unwrap();

        let data = std::fs::read_to_string(&path).unwrap();
        let mut lines = data.lines();
        assert_eq!(lines.next().unwrap(), "brand,model_count,sources,models");
        assert_eq!(lines.next().unwrap(), "Lada,1,AS24,Niva");
    }
}
