//! Report persistence

use std::path::{Path, PathBuf};

use dns_purge_core::error::{CoreError, CoreResult};
use dns_purge_core::types::RunReport;
use dns_purge_core::utils::datetime::file_stamp;

/// Writes run reports as pretty JSON files.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dns_purge_report_<mode>_<YYYYmmdd_HHMMSS>_<run-id-prefix>.json`
    pub fn file_name(report: &RunReport) -> String {
        let run_id: String = report.run_id.to_string().chars().take(8).collect();
        format!(
            "dns_purge_report_{}_{}_{run_id}.json",
            report.mode,
            file_stamp(&report.execution_timestamp)
        )
    }

    /// Write `report` into the directory, creating it if needed.
    pub async fn write(&self, report: &RunReport) -> CoreResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CoreError::StorageError(format!("{}: {e}", self.dir.display())))?;

        let path = self.dir.join(Self::file_name(report));
        let json = report.to_json_pretty()?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| CoreError::StorageError(format!("{}: {e}", path.display())))?;
        log::info!("Report written to {}", path.display());
        Ok(path)
    }
}
