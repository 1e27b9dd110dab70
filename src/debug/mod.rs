//! Debug bundle writer for inspecting the regularized system and per-method outcomes.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{ComparisonReport, NormalSystem};
use crate::error::AppError;
use crate::math::{dominance_margins, is_strictly_diagonally_dominant};

pub fn write_debug_bundle(
    dir: &Path,
    experiment_id: &str,
    system: &NormalSystem,
    report: &ComparisonReport,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("lfit_debug_{experiment_id}_{ts}.md"));

    let mut file = File::create(&path).map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    write_bundle(&mut file, experiment_id, system, report)
        .map_err(|e| AppError::new(4, format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

fn write_bundle(
    out: &mut impl Write,
    experiment_id: &str,
    system: &NormalSystem,
    report: &ComparisonReport,
) -> std::io::Result<()> {
    writeln!(out, "# lfit debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- experiment: {experiment_id}")?;
    writeln!(out, "- n_samples: {}", system.n_samples)?;
    writeln!(out, "- lambda: {:.3}", system.lambda)?;
    writeln!(
        out,
        "- strictly_diagonally_dominant: {}",
        is_strictly_diagonally_dominant(&system.ata)
    )?;

    writeln!(out, "\n## Regularized ATA")?;
    let n = system.ata.ncols();
    let header: Vec<String> = (0..n).map(|j| format!("c{j}")).collect();
    writeln!(out, "| row | {} | ATB | margin |", header.join(" | "))?;
    writeln!(out, "|{}", " - |".repeat(n + 3))?;
    let margins = dominance_margins(&system.ata);
    for i in 0..system.ata.nrows() {
        let cells: Vec<String> = system.ata.row(i).iter().map(|v| format!("{v:.6e}")).collect();
        writeln!(
            out,
            "| {i} | {} | {:.6e} | {:.6e} |",
            cells.join(" | "),
            system.atb[i],
            margins[i]
        )?;
    }

    writeln!(out, "\n## Methods")?;
    writeln!(out, "| method | theta | mae | rmse | r2 | points | iterations | converged | error |")?;
    writeln!(out, "| - | - | - | - | - | - | - | - | - |")?;
    for r in &report.results {
        let theta: Vec<String> = r.theta.iter().map(|v| format!("{v:.6e}")).collect();
        writeln!(
            out,
            "| {} | [{}] | {:.6} | {:.6} | {:.6} | {}/{} | {} | {} | {} |",
            r.method,
            theta.join(", "),
            r.mae,
            r.rmse,
            r.r2,
            r.valid_point_count,
            r.total_point_count,
            r.iterations.map_or_else(|| "-".to_string(), |i| i.to_string()),
            r.converged,
            r.error.as_deref().unwrap_or("-"),
        )?;
    }

    writeln!(out, "\n## Validation")?;
    for c in &report.validation.checks {
        writeln!(out, "- {} [{}]: {}", c.check, c.status.label(), c.details)?;
    }

    Ok(())
}
