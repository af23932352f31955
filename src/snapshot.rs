use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::store::Store;

/// Write the current keyspace to `path`. The encoding happens under the
/// store lock; file I/O happens after the guard is dropped, against a
/// temporary file that is renamed into place so readers never observe a
/// half-written snapshot.
pub fn save(store: &Store, path: &Path) -> std::io::Result<()> {
    let bytes = store.lock().snapshot();

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, &bytes)?;
    fs::rename(&tmp_path, path)?;

    debug!("snapshot written to {}", path.display());
    Ok(())
}

/// Restore the keyspace from `path`. Returns `Ok(false)` when no snapshot
/// file exists; corrupt contents surface as `Err` and leave the keyspace
/// empty.
pub fn load(store: &Store, path: &Path) -> crate::Result<bool> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };

    store.lock().restore(&bytes)?;
    Ok(true)
}

/// Periodically persist the keyspace until shutdown is signalled. Failures
/// are logged; the next tick retries.
pub async fn run_save_loop(
    store: Store,
    path: PathBuf,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("snapshot loop started (period {:?})", period);

    let mut ticker = tokio::time::interval(period);
    // The first tick fires immediately; skip it so a fresh server does not
    // overwrite an existing snapshot before any command ran.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = save(&store, &path) {
                    error!("failed to write snapshot to {}: {}", path.display(), err);
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    debug!("snapshot loop stopped");
}
