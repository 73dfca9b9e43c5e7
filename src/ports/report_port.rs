//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SeasontraderError;
use std::path::Path;

/// Port for handing backtest output to a presentation layer.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SeasontraderError>;

    /// Default implementation: writes each result next to `output_path` with
    /// the result's index appended to the file stem.
    fn write_all(
        &self,
        results: &[BacktestResult],
        output_path: &Path,
    ) -> Result<(), SeasontraderError> {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        let ext = output_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "csv".to_string());
        for (i, result) in results.iter().enumerate() {
            let path = output_path.with_file_name(format!("{}_{}.{}", stem, i + 1, ext));
            self.write(result, &path)?;
        }
        Ok(())
    }
}
