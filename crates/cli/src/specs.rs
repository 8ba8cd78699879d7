//! `cardex merge-specs` / `cardex validate` — specification merge commands.

use std::path::{Path, PathBuf};

use cardex_recon::engine::SpecMergeRun;
use cardex_recon::model::SpecCategory;
use cardex_recon::{run_spec_merge, MergeConfig, MergedSpecRecord};

use crate::exit_codes::EXIT_INVALID_CONFIG;
use crate::{load_payloads, CliError};

fn config_err(msg: impl Into<String>) -> CliError {
    CliError { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
}

fn load_config(path: &Path) -> Result<MergeConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::args(format!("cannot read config: {e}")))?;
    MergeConfig::from_toml(&config_str).map_err(|e| config_err(e.to_string()))
}

pub fn cmd_merge_specs(
    payload_paths: Vec<PathBuf>,
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    csv_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let payloads = load_payloads(&payload_paths)?;

    let run = run_spec_merge(&payloads, &config);

    for warning in &run.warnings {
        eprintln!("warning: {warning}");
    }

    let json_value = run.to_json();

    if let Some(ref path) = output_file {
        let json_str = serde_json::to_string_pretty(&json_value)
            .map_err(|e| CliError::parse(format!("JSON serialization error: {e}")))?;
        std::fs::write(path, json_str)
            .map_err(|e| CliError::args(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = csv_file {
        write_specs_csv(path, &run)?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&json_value)
            .map_err(|e| CliError::parse(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!(
        "merged {} model(s) under policy '{}' — {} warning(s)",
        run.records.len(),
        config.name,
        run.warnings.len(),
    );
    eprintln!(
        "coverage: {} of {} model(s) at {}+ filled categories",
        run.coverage.most_complete.len(),
        run.coverage.total_models,
        run.coverage
            .most_complete
            .first()
            .map(|m| m.filled_categories)
            .unwrap_or(0),
    );

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: policy '{}' with {} prioritized source(s), default confidence {}",
        config.name,
        config.priority.len(),
        config.defaults.confidence,
    );
    Ok(())
}

/// Long-format CSV: one row per merged field, equipment and unclassified
/// included. Lets the output land in a spreadsheet without JSON tooling.
fn specs_csv_rows(record: &MergedSpecRecord) -> Vec<[String; 7]> {
    let mut rows = Vec::new();
    for category in SpecCategory::SCALAR {
        let Some(fields) = record.scalars.get(&category) else {
            continue;
        };
        for (field, fv) in fields {
            rows.push([
                record.brand.clone(),
                record.model.clone(),
                category.to_string(),
                field.clone(),
                fv.value.clone(),
                fv.source.clone(),
                fv.confidence.to_string(),
            ]);
        }
    }
    for item in &record.equipment {
        rows.push([
            record.brand.clone(),
            record.model.clone(),
            SpecCategory::Equipment.to_string(),
            item.clone(),
            "present".to_string(),
            String::new(),
            String::new(),
        ]);
    }
    for (category, fields) in &record.unclassified {
        for (field, fv) in fields {
            rows.push([
                record.brand.clone(),
                record.model.clone(),
                category.clone(),
                field.clone(),
                fv.value.clone(),
                fv.source.clone(),
                fv.confidence.to_string(),
            ]);
        }
    }
    rows
}

fn write_specs_csv(path: &Path, run: &SpecMergeRun) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| CliError::args(format!("cannot write {}: {e}", path.display())))?;
    writer
        .write_record(["brand", "model", "category", "field", "value", "source", "confidence"])
        .map_err(|e| CliError::args(format!("CSV write error: {e}")))?;
    for record in &run.records {
        for row in specs_csv_rows(record) {
            writer
                .write_record(&row)
                .map_err(|e| CliError::args(format!("CSV write error: {e}")))?;
        }
    }
    writer
        .flush()
        .map_err(|e| CliError::args(format!("CSV write error: {e}")))?;
    Ok(())
}
