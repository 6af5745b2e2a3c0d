//! Per-run log files such as `parser.log` and `comparison.log`.
//!
//! Events are ordinary `tracing` events; while `work` runs they go to a
//! subscriber that writes `LEVEL message` lines into the run directory.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;

/// Runs `work` with a thread-scoped subscriber writing to `path`.
///
/// The file is created (or truncated) before `work` starts, so it exists even
/// when `work` bails out early.
pub fn capture_to_file<T>(path: &Path, work: impl FnOnce() -> T) -> io::Result<T> {
    let file = File::create(path)?;
    let subscriber = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_max_level(LevelFilter::INFO)
        .finish();
    Ok(tracing::subscriber::with_default(subscriber, work))
}

#[cfg(test)]
mod tests {
    use super::capture_to_file;
    use std::fs;
    use tempfile::TempDir;
    use tracing::{debug, info, warn};

    #[test]
    fn events_land_in_the_file_at_info_and_above() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("parser.log");

        let value = capture_to_file(&path, || {
            info!("Parsing DSPF golden.spf");
            debug!("token stream ready");
            warn!("instance section is empty");
            7
        })
        .expect("log should be written");

        assert_eq!(value, 7);
        let log = fs::read_to_string(&path).expect("log should be readable");
        let lines: Vec<&str> = log.lines().map(str::trim_start).collect();
        assert_eq!(
            lines,
            ["INFO Parsing DSPF golden.spf", "WARN instance section is empty"]
        );
    }
}
