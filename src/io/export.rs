//! Write comparison outputs: the metrics text and the validation JSON document.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ComparisonReport, MethodResult, ValidationReport};
use crate::error::AppError;
use crate::io::ExperimentPaths;
use crate::report::{format_metrics, parse_metrics};

/// Validation document as persisted to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDocument {
    pub experiment_id: String,
    pub generated_at: DateTime<Utc>,
    /// Keyed by method name.
    pub methods: BTreeMap<String, MethodResult>,
    pub validation: ValidationReport,
}

impl ValidationDocument {
    pub fn new(experiment_id: &str, report: &ComparisonReport) -> Self {
        Self {
            experiment_id: experiment_id.to_string(),
            generated_at: Utc::now(),
            methods: report
                .results
                .iter()
                .map(|r| (r.method.name().to_string(), r.clone()))
                .collect(),
            validation: report.validation.clone(),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", parent.display())))?;
    }
    Ok(())
}

pub fn write_metrics_text(path: &Path, report: &ComparisonReport) -> Result<(), AppError> {
    ensure_parent(path)?;
    fs::write(path, format_metrics(report))
        .map_err(|e| AppError::new(2, format!("Failed to write metrics '{}': {e}", path.display())))
}

pub fn write_validation_json(path: &Path, experiment_id: &str, report: &ComparisonReport) -> Result<(), AppError> {
    ensure_parent(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create validation JSON '{}': {e}", path.display())))?;

    let doc = ValidationDocument::new(experiment_id, report);
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write validation JSON: {e}")))?;

    Ok(())
}

pub fn read_validation_json(path: &Path) -> Result<ValidationDocument, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open validation JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid validation JSON: {e}")))
}

/// Parse `metrics.txt` of every experiment under `output_root`, keyed by experiment id.
///
/// Directories without a metrics file (e.g. runs that failed before writing) are
/// skipped; a metrics file that does not parse is an error.
pub fn load_all_metrics(output_root: &Path) -> Result<BTreeMap<String, Vec<MethodResult>>, AppError> {
    let entries = fs::read_dir(output_root)
        .map_err(|e| AppError::new(2, format!("Failed to list '{}': {e}", output_root.display())))?;

    let mut all = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::new(2, format!("Failed to list '{}': {e}", output_root.display())))?;
        if !entry.path().is_dir() {
            continue;
        }
        let experiment_id = entry.file_name().to_string_lossy().into_owned();
        let metrics = ExperimentPaths::new(experiment_id.as_str(), output_root, output_root).metrics();
        if !metrics.is_file() {
            tracing::debug!(experiment = %experiment_id, "no metrics file, skipping");
            continue;
        }

        let text = fs::read_to_string(&metrics)
            .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", metrics.display())))?;
        let results = parse_metrics(&text)
            .map_err(|e| AppError::new(e.exit_code(), format!("{experiment_id}: {}", e.message())))?;
        all.insert(experiment_id, results);
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CheckRecord, CheckStatus, SolveMethod};

    fn report() -> ComparisonReport {
        ComparisonReport {
            results: SolveMethod::ALL
                .iter()
                .map(|&m| MethodResult::failed(m, 8, format!("{m} failed")))
                .collect(),
            validation: ValidationReport {
                checks: vec![CheckRecord {
                    check: "r2_gauss".to_string(),
                    status: CheckStatus::Alert,
                    details: "R2=-1.0000".to_string(),
                }],
            },
        }
    }

    #[test]
    fn writes_both_outputs_into_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = dir.path().join("exp").join("metrics.txt");
        let validation = dir.path().join("exp").join("validation.json");
        let report = report();

        write_metrics_text(&metrics, &report).unwrap();
        write_validation_json(&validation, "exp", &report).unwrap();

        let parsed = parse_metrics(&fs::read_to_string(&metrics).unwrap()).unwrap();
        assert_eq!(parsed, report.results);

        let doc = read_validation_json(&validation).unwrap();
        assert_eq!(doc.experiment_id, "exp");
        assert_eq!(doc.methods.len(), 3);
        assert!(doc.methods.contains_key("gauss_seidel"));
        assert_eq!(doc.validation, report.validation);

        let raw = fs::read_to_string(&validation).unwrap();
        assert!(raw.contains("\"detalhes\""));
        assert!(raw.contains("\"ALERTA\""));
    }

    #[test]
    fn loads_metrics_of_every_experiment() {
        let root = tempfile::tempdir().unwrap();
        let report = report();
        write_metrics_text(&root.path().join("exp_b").join("metrics.txt"), &report).unwrap();
        write_metrics_text(&root.path().join("exp_a").join("metrics.txt"), &report).unwrap();
        fs::create_dir_all(root.path().join("crashed")).unwrap();
        fs::write(root.path().join("comparative.txt"), "not an experiment").unwrap();

        let all = load_all_metrics(root.path()).unwrap();
        let ids: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(ids, ["exp_a", "exp_b"]);
        assert_eq!(all["exp_a"], report.results);
    }

    #[test]
    fn broken_metrics_file_names_the_experiment() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("exp_bad");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("metrics.txt"), "Method: lu\n").unwrap();

        let err = load_all_metrics(root.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().starts_with("exp_bad: "));
    }
}
