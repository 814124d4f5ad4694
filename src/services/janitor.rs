//! Periodic output-directory sweep.
//!
//! Responses are served from in-memory bytes; the on-disk rendered masks are
//! disposable parity copies, cleared wholesale on a fixed interval to bound
//! disk usage. The sweep tracks no per-file age or in-use state.

use std::path::{Path, PathBuf};
use tokio::time::{interval, Duration};
use tracing::{info, warn};

pub struct Janitor {
    output_dir: PathBuf,
    interval_secs: u64,
}

impl Janitor {
    pub fn new(output_dir: impl Into<PathBuf>, interval_secs: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            interval_secs,
        }
    }

    /// Spawn the sweep loop. The first tick fires immediately, so the
    /// directory is also cleared once at startup.
    ///
    /// A failed sweep is logged and skipped for that cycle; it never
    /// propagates to in-flight requests.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        info!(
            "janitor: sweeping {} every {}s",
            self.output_dir.display(),
            self.interval_secs
        );
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(self.interval_secs.max(1)));
            loop {
                ticker.tick().await;
                match sweep(&self.output_dir) {
                    Ok(0) => {}
                    Ok(n) => info!("janitor: removed {n} rendered mask(s)"),
                    Err(e) => warn!("janitor: sweep skipped: {e}"),
                }
            }
        })
    }
}

/// Delete every regular file in `dir`. Returns the number removed.
pub fn sweep(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("janitor: could not remove {}: {e}", path.display());
            continue;
        }
        removed += 1;
    }
    Ok(removed)
}
