//! Saved run reports: `<report-dir>/<env>_<host_port>_<epoch-secs>/`
//!
//! `report.json` holds the full `RunReport`, `summary.json` the verdict and
//! counts.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use petcontract_core::RunReport;

/// Write `report` under `base` and return the directory it went to.
pub fn save_report(base: &Path, report: &RunReport) -> Result<PathBuf, std::io::Error> {
    let dir = base.join(dir_name(report, epoch_secs()));
    std::fs::create_dir_all(&dir)?;

    let full = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
    std::fs::write(dir.join("report.json"), full)?;

    let verdict = report.verdict();
    let summary = serde_json::json!({
        "verdict": verdict,
        "stats": {
            "groups": report.groups.len(),
            "assertions": report.assertion_count(),
            "failed_assertions": report.failed_assertion_count(),
            "cleanup_failures": report.cleanup_failure_count(),
        },
        "meta": {
            "environment": report.environment,
            "base_url": report.base_url,
            "duration_ms": report.groups.iter().map(|g| g.duration_ms).sum::<u64>(),
        },
    });
    let summary = serde_json::to_string_pretty(&summary).map_err(std::io::Error::other)?;
    std::fs::write(dir.join("summary.json"), summary)?;

    Ok(dir)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn dir_name(report: &RunReport, secs: u64) -> String {
    format!(
        "{}_{}_{secs}",
        report.environment,
        host_port(&report.base_url)
    )
}

/// `"http://localhost:8080/v2"` → `"localhost_8080"`
fn host_port(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .filter(|h| !h.is_empty())
        .unwrap_or("unknown")
        .replace(':', "_")
}
