//! Metrics text block: formatting and parsing.
//!
//! One block per method, blank line between blocks:
//!
//! ```text
//! Method: gauss
//! Parameters: [0.010344634246796805, 2.8624534127559502e-5, 7.5e-5, 3.2887e-5]
//! Time: 0.0001s
//! MAE: 0.9123
//! RMSE: 1.1115
//! R2: 0.9970
//! Points: 20/20
//! Iterations: -
//! Converged: yes
//! ```
//!
//! Parameters use the shortest round-trip float representation so they parse back
//! bit-identical; timing and error metrics are printed with 4 decimals. Failed
//! methods add an `Error:` line.

use crate::domain::{ComparisonReport, MethodResult, PARAM_COUNT, SolveMethod, Theta};
use crate::error::AppError;

/// Format every method block of a report.
pub fn format_metrics(report: &ComparisonReport) -> String {
    format_results(&report.results)
}

pub fn format_results(results: &[MethodResult]) -> String {
    let blocks: Vec<String> = results.iter().map(format_method_block).collect();
    blocks.join("\n")
}

/// Format a single method block (ends with a newline).
pub fn format_method_block(r: &MethodResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Method: {}\n", r.method));
    out.push_str(&format!("Parameters: {}\n", fmt_theta(&r.theta)));
    out.push_str(&format!("Time: {:.4}s\n", r.elapsed_seconds));
    out.push_str(&format!("MAE: {:.4}\n", r.mae));
    out.push_str(&format!("RMSE: {:.4}\n", r.rmse));
    out.push_str(&format!("R2: {:.4}\n", r.r2));
    out.push_str(&format!("Points: {}/{}\n", r.valid_point_count, r.total_point_count));
    match r.iterations {
        Some(n) => out.push_str(&format!("Iterations: {n}\n")),
        None => out.push_str("Iterations: -\n"),
    }
    out.push_str(&format!("Converged: {}\n", if r.converged { "yes" } else { "no" }));
    if let Some(err) = &r.error {
        out.push_str(&format!("Error: {}\n", err.replace('\n', " ")));
    }
    out
}

fn fmt_theta(theta: &Theta) -> String {
    let parts: Vec<String> = theta.iter().map(|x| format!("{x:?}")).collect();
    format!("[{}]", parts.join(", "))
}

/// Rebuild method results from a metrics text.
///
/// Unknown keys are ignored so older/newer writers stay readable; a block missing
/// `Parameters`, `Time`, `MAE`, `RMSE`, `R2` or `Points` is an error.
pub fn parse_metrics(text: &str) -> Result<Vec<MethodResult>, AppError> {
    let mut out = Vec::new();
    let mut current: Option<PartialBlock> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let Some((key, raw_value)) = raw.split_once(':') else {
            return Err(parse_error(line_no, format!("expected 'key: value', got '{}'", raw.trim())));
        };
        let key = key.trim();
        // Only the separator space is dropped so `Error:` text survives verbatim.
        let raw_value = raw_value.strip_prefix(' ').unwrap_or(raw_value);
        let value = raw_value.trim();

        if key == "Method" {
            if let Some(block) = current.take() {
                out.push(block.finish()?);
            }
            let method = SolveMethod::from_name(value)
                .ok_or_else(|| parse_error(line_no, format!("unknown method '{value}'")))?;
            current = Some(PartialBlock::new(method, line_no));
            continue;
        }

        let Some(block) = current.as_mut() else {
            return Err(parse_error(line_no, format!("'{key}' before any 'Method:' line")));
        };

        match key {
            "Parameters" => block.theta = Some(parse_theta(value).map_err(|m| parse_error(line_no, m))?),
            "Time" => block.elapsed = Some(parse_f64(value.trim_end_matches('s'), line_no)?),
            "MAE" => block.mae = Some(parse_f64(value, line_no)?),
            "RMSE" => block.rmse = Some(parse_f64(value, line_no)?),
            "R2" => block.r2 = Some(parse_f64(value, line_no)?),
            "Points" => {
                let (valid, total) = value
                    .split_once('/')
                    .ok_or_else(|| parse_error(line_no, format!("expected 'valid/total', got '{value}'")))?;
                block.points = Some((parse_usize(valid, line_no)?, parse_usize(total, line_no)?));
            }
            "Iterations" => {
                block.iterations = if value == "-" {
                    None
                } else {
                    Some(parse_usize(value, line_no)?)
                };
            }
            "Converged" => block.converged = value == "yes",
            "Error" => block.error = Some(raw_value.to_string()),
            _ => {}
        }
    }

    if let Some(block) = current.take() {
        out.push(block.finish()?);
    }

    Ok(out)
}

struct PartialBlock {
    method: SolveMethod,
    line: usize,
    theta: Option<Theta>,
    elapsed: Option<f64>,
    mae: Option<f64>,
    rmse: Option<f64>,
    r2: Option<f64>,
    points: Option<(usize, usize)>,
    iterations: Option<usize>,
    converged: bool,
    error: Option<String>,
}

impl PartialBlock {
    fn new(method: SolveMethod, line: usize) -> Self {
        Self {
            method,
            line,
            theta: None,
            elapsed: None,
            mae: None,
            rmse: None,
            r2: None,
            points: None,
            iterations: None,
            converged: false,
            error: None,
        }
    }

    fn finish(self) -> Result<MethodResult, AppError> {
        let missing = |field: &str| {
            parse_error(
                self.line,
                format!("block for '{}' is missing '{field}'", self.method),
            )
        };
        let theta = self.theta.ok_or_else(|| missing("Parameters"))?;
        let elapsed_seconds = self.elapsed.ok_or_else(|| missing("Time"))?;
        let mae = self.mae.ok_or_else(|| missing("MAE"))?;
        let rmse = self.rmse.ok_or_else(|| missing("RMSE"))?;
        let r2 = self.r2.ok_or_else(|| missing("R2"))?;
        let (valid_point_count, total_point_count) = self.points.ok_or_else(|| missing("Points"))?;

        Ok(MethodResult {
            method: self.method,
            theta,
            elapsed_seconds,
            mae,
            rmse,
            r2,
            valid_point_count,
            total_point_count,
            iterations: self.iterations,
            converged: self.converged,
            error: self.error,
        })
    }
}

fn parse_theta(value: &str) -> Result<Theta, String> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(|| format!("expected '[..]', got '{value}'"))?;
    let values: Vec<f64> = inner
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("bad parameter '{}': {e}", p.trim())))
        .collect::<Result<_, _>>()?;
    if values.len() != PARAM_COUNT {
        return Err(format!("expected {PARAM_COUNT} parameters, got {}", values.len()));
    }
    let mut theta = [0.0; PARAM_COUNT];
    theta.copy_from_slice(&values);
    Ok(theta)
}

fn parse_f64(value: &str, line: usize) -> Result<f64, AppError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| parse_error(line, format!("bad number '{value}': {e}")))
}

fn parse_usize(value: &str, line: usize) -> Result<usize, AppError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| parse_error(line, format!("bad count '{value}': {e}")))
}

fn parse_error(line: usize, message: impl AsRef<str>) -> AppError {
    AppError::new(2, format!("Invalid metrics text (line {line}): {}", message.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_result() -> MethodResult {
        MethodResult {
            method: SolveMethod::Jacobi,
            theta: [0.010344634246796805, 2.8624534127559502e-5, -7.509955052132883e-5, 3.288700278342973],
            elapsed_seconds: 0.000123456,
            mae: 0.912345,
            rmse: 1.111457812,
            r2: 0.99700565,
            valid_point_count: 19,
            total_point_count: 20,
            iterations: Some(15),
            converged: true,
            error: None,
        }
    }

    fn round4(x: f64) -> f64 {
        (x * 1e4).round() / 1e4
    }

    #[test]
    fn round_trip_keeps_theta_exact_and_metrics_to_print_precision() {
        let original = ok_result();
        let text = format_method_block(&original);
        let parsed = parse_metrics(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        let p = &parsed[0];

        assert_eq!(p.method, original.method);
        assert_eq!(p.theta, original.theta);
        assert!((p.elapsed_seconds - round4(original.elapsed_seconds)).abs() < 1e-12);
        assert!((p.mae - round4(original.mae)).abs() < 1e-12);
        assert!((p.rmse - round4(original.rmse)).abs() < 1e-12);
        assert!((p.r2 - round4(original.r2)).abs() < 1e-12);
        assert_eq!((p.valid_point_count, p.total_point_count), (19, 20));
        assert_eq!(p.iterations, Some(15));
        assert!(p.converged);
        assert!(p.error.is_none());
    }

    #[test]
    fn failed_block_round_trips_sentinels_and_error() {
        let failed = MethodResult::failed(SolveMethod::GaussSeidel, 20, "zero diagonal element A[1][1] = 0e0");
        let text = format_results(&[ok_result(), failed.clone()]);
        assert!(text.contains("\n\nMethod: gauss_seidel\n"));

        let parsed = parse_metrics(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], failed);
    }

    #[test]
    fn block_layout_is_stable() {
        let text = format_method_block(&ok_result());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Method: jacobi");
        assert_eq!(lines[2], "Time: 0.0001s");
        assert_eq!(lines[3], "MAE: 0.9123");
        assert_eq!(lines[6], "Points: 19/20");
        assert_eq!(lines[7], "Iterations: 15");
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(parse_metrics("Parameters: [1, 2, 3, 4]\n").is_err());
        assert!(parse_metrics("Method: lu\n").is_err());
        assert!(parse_metrics("Method: gauss\nParameters: [1, 2]\n").is_err());
        // Missing RMSE/R2/Points.
        assert!(parse_metrics("Method: gauss\nParameters: [1, 2, 3, 4]\nTime: 0.1s\nMAE: 1\n").is_err());
        assert!(parse_metrics("").unwrap().is_empty());
    }

    #[test]
    fn error_text_keeps_surrounding_whitespace() {
        let failed = MethodResult::failed(SolveMethod::Gauss, 6, "  singular: pivot 0e0 at column 2 ");
        let parsed = parse_metrics(&format_method_block(&failed)).unwrap();
        assert_eq!(parsed[0].error, failed.error);
    }
}
