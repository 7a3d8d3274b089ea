//! Run identity and well-known artifact locations shared with the external
//! simulator.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Field delimiter of the simulator's KPI result file.
pub const KPI_FILE_DELIM: u8 = b';';

/// Fresh run identifier: seconds since the UNIX epoch, as a plain decimal
/// string. Monotonic enough for run directories that are created at most
/// once per second.
pub fn create_run_id() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let run_id = seconds.to_string();
    info!("Run id created: {}", run_id);
    run_id
}

/// Per-run working directory under the simulator output root.
pub fn run_dir(output_dir: &Path, run_id: &str) -> PathBuf {
    output_dir.join(format!("r{run_id}"))
}

/// KPI result file the simulator is expected to produce for `run_id`.
pub fn kpi_file_path(output_dir: &Path, run_id: &str) -> PathBuf {
    run_dir(output_dir, run_id).join(format!("glob_kpis_{run_id}.csv"))
}

/// Geometry configuration file consumed by the simulator for `run_id`.
pub fn geometry_conf_path(conf_dir: &Path, run_id: &str) -> PathBuf {
    conf_dir.join(format!("geometry_{run_id}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_is_a_decimal_timestamp() {
        let run_id = create_run_id();
        assert!(!run_id.is_empty());
        assert!(run_id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn artifact_paths_embed_the_run_id() {
        let out = Path::new("/tmp/sim-out");
        assert_eq!(
            kpi_file_path(out, "123"),
            PathBuf::from("/tmp/sim-out/r123/glob_kpis_123.csv")
        );
        assert_eq!(
            geometry_conf_path(Path::new("/tmp/conf"), "123"),
            PathBuf::from("/tmp/conf/geometry_123.json")
        );
    }
}
