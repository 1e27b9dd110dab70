//! Request-log ingest and normalization.
//!
//! Turns the load-test client's `requests_log.json` into `Sample`s that are safe
//! to fit. Records are never rejected: missing sizes/latencies fall back to the
//! floor values and everything is clamped to physical bounds.
//!
//! Cluster labels come from an external clustering step as a JSON array of
//! integers, one per sample.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{LATENCY_MIN, SIZE_MIN, Sample};
use crate::error::AppError;

/// File name of the request log inside an experiment's input directory.
pub const REQUEST_LOG_FILE: &str = "requests_log.json";
/// File name of the optional cluster label array.
pub const CLUSTER_LABELS_FILE: &str = "cluster_labels.json";

/// One record as written by the load-test client. Every field is optional.
///
/// Numeric fields also accept numeric strings; anything unparseable (`""`,
/// `"abc"`, objects) reads as missing so one bad record never rejects the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    #[serde(default, deserialize_with = "lenient_number")]
    pub client_id: Option<u64>,
    /// KB.
    #[serde(default, deserialize_with = "lenient_number")]
    pub file_size: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub status_code: Option<u16>,
    /// Seconds.
    #[serde(default, deserialize_with = "lenient_number")]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.to_string().parse().ok(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Preprocessed request log.
#[derive(Debug, Clone)]
pub struct IngestedLog {
    pub samples: Vec<Sample>,
    pub records_read: usize,
    /// Records whose size or latency had to be substituted.
    pub substituted: usize,
    /// Records carrying a client-side error.
    pub errored: usize,
}

pub fn load_request_log(path: &Path) -> Result<Vec<RequestRecord>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open request log '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid request log '{}': {e}", path.display())))
}

/// Normalize records into samples (cluster id 0 until labelled).
pub fn preprocess_logs(records: &[RequestRecord]) -> IngestedLog {
    let mut substituted = 0usize;
    let samples = records
        .iter()
        .map(|r| {
            let size = r.file_size.filter(|v| v.is_finite());
            let latency = r.elapsed_time.filter(|v| v.is_finite());
            if size.is_none() || latency.is_none() {
                substituted += 1;
            }
            Sample::new(size.unwrap_or(SIZE_MIN), latency.unwrap_or(LATENCY_MIN), 0)
        })
        .collect();
    let errored = records.iter().filter(|r| r.error.is_some()).count();

    IngestedLog {
        samples,
        records_read: records.len(),
        substituted,
        errored,
    }
}

pub fn load_cluster_labels(path: &Path) -> Result<Vec<i32>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open cluster labels '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid cluster labels '{}': {e}", path.display())))
}

/// Labels for `n` samples: from `path` when given, otherwise a single cluster.
pub fn resolve_cluster_labels(path: Option<&Path>, n: usize) -> Result<Vec<i32>, AppError> {
    match path {
        Some(p) => load_cluster_labels(p),
        None => Ok(vec![0; n]),
    }
}

/// Deterministic per-experiment file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentPaths {
    pub experiment_id: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ExperimentPaths {
    pub fn new(experiment_id: impl Into<String>, input_root: &Path, output_root: &Path) -> Self {
        let experiment_id = experiment_id.into();
        Self {
            input_dir: input_root.join(&experiment_id),
            output_dir: output_root.join(&experiment_id),
            experiment_id,
        }
    }

    pub fn request_log(&self) -> PathBuf {
        self.input_dir.join(REQUEST_LOG_FILE)
    }

    /// Default label file; only used when it exists.
    pub fn cluster_labels(&self) -> PathBuf {
        self.input_dir.join(CLUSTER_LABELS_FILE)
    }

    pub fn metrics(&self) -> PathBuf {
        self.output_dir.join("metrics.txt")
    }

    pub fn validation(&self) -> PathBuf {
        self.output_dir.join("validation.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn preprocess_substitutes_and_clamps() {
        let records = vec![
            RequestRecord {
                file_size: Some(512.0),
                elapsed_time: Some(0.25),
                ..RequestRecord::default()
            },
            RequestRecord {
                file_size: None,
                elapsed_time: Some(1e6),
                error: Some("timeout".to_string()),
                ..RequestRecord::default()
            },
            RequestRecord {
                file_size: Some(1e9),
                elapsed_time: None,
                ..RequestRecord::default()
            },
        ];
        let ingested = preprocess_logs(&records);
        assert_eq!(ingested.records_read, 3);
        assert_eq!(ingested.substituted, 2);
        assert_eq!(ingested.errored, 1);
        assert_eq!(ingested.samples[0], Sample::new(512.0, 0.25, 0));
        assert_eq!(ingested.samples[1].size, 0.1);
        assert_eq!(ingested.samples[1].latency, 300.0);
        assert_eq!(ingested.samples[2].size, 100_000.0);
        assert_eq!(ingested.samples[2].latency, 0.001);
    }

    #[test]
    fn loads_log_with_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"client_id": 0, "file_size": 300.5, "status_code": 200, "elapsed_time": 0.0123, "error": null}},
                {{"client_id": 1, "error": "connection refused"}}
            ]"#
        )
        .unwrap();

        let records = load_request_log(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file_size, Some(300.5));
        assert_eq!(records[1].elapsed_time, None);
        assert_eq!(records[1].error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn labels_default_to_single_cluster() {
        assert_eq!(resolve_cluster_labels(None, 3).unwrap(), vec![0, 0, 0]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[0, 2, 1, -1]").unwrap();
        assert_eq!(
            resolve_cluster_labels(Some(file.path()), 4).unwrap(),
            vec![0, 2, 1, -1]
        );
    }

    #[test]
    fn missing_log_is_an_input_error() {
        let err = load_request_log(Path::new("/nonexistent/requests_log.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn experiment_layout_is_deterministic() {
        let paths = ExperimentPaths::new("exp1", Path::new("in"), Path::new("out"));
        assert_eq!(paths.request_log(), PathBuf::from("in/exp1/requests_log.json"));
        assert_eq!(paths.metrics(), PathBuf::from("out/exp1/metrics.txt"));
        assert_eq!(paths.validation(), PathBuf::from("out/exp1/validation.json"));
    }

    #[test]
    fn unparseable_numeric_fields_are_substituted_not_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"file_size": "", "elapsed_time": 0.5}},
                {{"file_size": 12.0, "elapsed_time": "0.25", "status_code": "200"}},
                {{"file_size": "abc", "elapsed_time": null}},
                {{"file_size": " 64 ", "elapsed_time": {{"s": 1}}}}
            ]"#
        )
        .unwrap();

        let records = load_request_log(file.path()).unwrap();
        assert_eq!(records[0].file_size, None);
        assert_eq!(records[1].elapsed_time, Some(0.25));
        assert_eq!(records[1].status_code, Some(200));
        assert_eq!(records[3].file_size, Some(64.0));

        let ingested = preprocess_logs(&records);
        assert_eq!(ingested.substituted, 3);
        assert_eq!(ingested.samples[0], Sample::new(0.1, 0.5, 0));
        assert_eq!(ingested.samples[1], Sample::new(12.0, 0.25, 0));
        assert_eq!(ingested.samples[2], Sample::new(0.1, 0.001, 0));
        assert_eq!(ingested.samples[3], Sample::new(64.0, 0.001, 0));
    }
}
