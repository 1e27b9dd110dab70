//! Shared comparison pipeline used by the `compare` and `demo` commands.
//!
//! request log -> samples -> labels -> normal system -> three solvers -> validation
//! -> metrics text + validation JSON (+ optional debug bundle)

use std::path::{Path, PathBuf};

use crate::data::{SyntheticConfig, generate_sample};
use crate::domain::{FitConfig, Sample};
use crate::error::AppError;
use crate::fit::{Comparison, compare_with_system};
use crate::io::{ExperimentPaths, load_request_log, preprocess_logs, resolve_cluster_labels};

/// What a single run should read and write.
#[derive(Debug, Clone)]
pub struct ExperimentRequest {
    pub paths: ExperimentPaths,
    /// Explicit label file; overrides the experiment's default one.
    pub labels: Option<PathBuf>,
    pub config: FitConfig,
    pub debug_bundle: bool,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub experiment_id: String,
    pub comparison: Comparison,
    /// Files written, in write order.
    pub written: Vec<PathBuf>,
}

/// Fit an experiment's request log and persist the outputs.
pub fn run_experiment(request: &ExperimentRequest) -> Result<RunOutput, AppError> {
    let paths = &request.paths;
    let records = load_request_log(&paths.request_log())?;
    let ingested = preprocess_logs(&records);
    tracing::info!(
        experiment = %paths.experiment_id,
        records = ingested.records_read,
        substituted = ingested.substituted,
        errored = ingested.errored,
        "request log loaded"
    );

    let label_path = label_source(request.labels.as_deref(), &paths.cluster_labels());
    let labels = resolve_cluster_labels(label_path.as_deref(), ingested.samples.len())?;

    run_samples(paths, &ingested.samples, &labels, &request.config, request.debug_bundle)
}

/// Run the comparison on synthetic samples; outputs are only written when
/// `paths` is given.
pub fn run_demo(
    synthetic: &SyntheticConfig,
    config: &FitConfig,
    paths: Option<&ExperimentPaths>,
    debug_bundle: bool,
) -> Result<RunOutput, AppError> {
    let data = generate_sample(synthetic)?;
    tracing::info!(n = data.samples.len(), seed = synthetic.seed, "synthetic samples generated");

    match paths {
        Some(paths) => run_samples(paths, &data.samples, &data.labels, config, debug_bundle),
        None => Ok(RunOutput {
            experiment_id: "demo".to_string(),
            comparison: compare_with_system(&data.samples, &data.labels, config)?,
            written: Vec::new(),
        }),
    }
}

fn run_samples(
    paths: &ExperimentPaths,
    samples: &[Sample],
    labels: &[i32],
    config: &FitConfig,
    debug_bundle: bool,
) -> Result<RunOutput, AppError> {
    let comparison = compare_with_system(samples, labels, config)?;

    let mut written = vec![paths.metrics(), paths.validation()];
    crate::io::write_metrics_text(&paths.metrics(), &comparison.report)?;
    crate::io::write_validation_json(&paths.validation(), &paths.experiment_id, &comparison.report)?;

    if debug_bundle {
        let bundle = crate::debug::write_debug_bundle(
            &paths.output_dir.join("debug"),
            &paths.experiment_id,
            &comparison.system,
            &comparison.report,
        )?;
        written.push(bundle);
    }

    for alert in comparison.report.validation.alerts() {
        tracing::warn!(check = %alert.check, "{}", alert.details);
    }
    tracing::info!(experiment = %paths.experiment_id, files = written.len(), "outputs written");

    Ok(RunOutput {
        experiment_id: paths.experiment_id.clone(),
        comparison,
        written,
    })
}

/// Explicit file first, then the experiment default if present, else none.
fn label_source(explicit: Option<&Path>, default: &Path) -> Option<PathBuf> {
    match explicit {
        Some(p) => Some(p.to_path_buf()),
        None if default.is_file() => Some(default.to_path_buf()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{RequestRecord, read_validation_json};
    use crate::report::parse_metrics;
    use std::fs;

    fn write_experiment(input_root: &Path, id: &str, with_labels: bool) {
        let data = generate_sample(&SyntheticConfig::default()).unwrap();
        let records: Vec<RequestRecord> = data
            .samples
            .iter()
            .enumerate()
            .map(|(i, s)| RequestRecord {
                client_id: Some(i as u64),
                file_size: Some(s.size),
                status_code: Some(200),
                elapsed_time: Some(s.latency),
                error: None,
            })
            .collect();
        let dir = input_root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("requests_log.json"), serde_json::to_string(&records).unwrap()).unwrap();
        if with_labels {
            fs::write(dir.join("cluster_labels.json"), serde_json::to_string(&data.labels).unwrap()).unwrap();
        }
    }

    fn request(root: &Path, id: &str) -> ExperimentRequest {
        ExperimentRequest {
            paths: ExperimentPaths::new(id, &root.join("input"), &root.join("output")),
            labels: None,
            config: FitConfig::default(),
            debug_bundle: false,
        }
    }

    #[test]
    fn experiment_run_writes_parseable_outputs() {
        let root = tempfile::tempdir().unwrap();
        write_experiment(&root.path().join("input"), "exp1", true);

        let mut req = request(root.path(), "exp1");
        req.debug_bundle = true;
        let run = run_experiment(&req).unwrap();

        assert_eq!(run.written.len(), 3);
        for r in &run.comparison.report.results {
            assert!(r.r2 > 0.9, "{} r2 = {}", r.method, r.r2);
        }

        let text = fs::read_to_string(req.paths.metrics()).unwrap();
        let parsed = parse_metrics(&text).unwrap();
        assert_eq!(parsed.len(), 3);
        for (p, r) in parsed.iter().zip(&run.comparison.report.results) {
            assert_eq!(p.theta, r.theta);
        }

        let doc = read_validation_json(&req.paths.validation()).unwrap();
        assert_eq!(doc.experiment_id, "exp1");
        assert_eq!(doc.validation, run.comparison.report.validation);
    }

    #[test]
    fn missing_label_file_means_single_cluster() {
        let root = tempfile::tempdir().unwrap();
        write_experiment(&root.path().join("input"), "nolabels", false);

        let run = run_experiment(&request(root.path(), "nolabels")).unwrap();
        assert_eq!(run.written.len(), 2);
        assert!(run.comparison.report.results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn label_count_mismatch_is_an_input_error() {
        let root = tempfile::tempdir().unwrap();
        write_experiment(&root.path().join("input"), "bad", false);
        let labels = root.path().join("labels.json");
        fs::write(&labels, "[0, 1]").unwrap();

        let mut req = request(root.path(), "bad");
        req.labels = Some(labels);
        let err = run_experiment(&req).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn too_few_records_is_insufficient_data() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("input").join("tiny");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("requests_log.json"), r#"[{"file_size": 10.0, "elapsed_time": 0.5}]"#).unwrap();

        let err = run_experiment(&request(root.path(), "tiny")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn demo_without_paths_writes_nothing() {
        let run = run_demo(&SyntheticConfig::default(), &FitConfig::default(), None, false).unwrap();
        assert!(run.written.is_empty());
        assert_eq!(run.comparison.report.results.len(), 3);
    }
}
