//! Background map loading.
//!
//! A worker thread reads and parses the level file and hands the result back
//! over a channel. The main loop polls it between ticks; until it arrives the
//! simulation simply skips ticks.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use ashfall_common::{AshfallError, AshfallResult};
use ashfall_gameplay::MapData;

/// Reads and parses a level file.
pub fn load_map_file(path: &Path) -> AshfallResult<MapData> {
    let json = fs::read_to_string(path)?;
    let data = MapData::from_json(&json)?;
    debug!(
        "Parsed {}: {} walls, {} enemies",
        path.display(),
        data.walls.len(),
        data.enemies.len()
    );
    Ok(data)
}

/// A level being loaded on a worker thread.
#[derive(Debug)]
pub struct MapLoader {
    path: PathBuf,
    receiver: Receiver<AshfallResult<MapData>>,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl MapLoader {
    /// Starts loading `path` in the background.
    pub fn spawn(path: impl Into<PathBuf>) -> AshfallResult<Self> {
        let path = path.into();
        let (sender, receiver) = bounded(1);
        let worker_path = path.clone();
        let handle = thread::Builder::new()
            .name("map-loader".to_string())
            .spawn(move || {
                let result = load_map_file(&worker_path);
                if sender.send(result).is_err() {
                    warn!("Map loader finished after its receiver was dropped");
                }
            })?;
        info!("Loading map {}", path.display());
        Ok(Self {
            path,
            receiver,
            handle: Some(handle),
            finished: false,
        })
    }

    /// Level file being loaded.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits up to `timeout` for the result. Returns `None` while still
    /// loading or after the result was already taken.
    pub fn poll(&mut self, timeout: Duration) -> Option<AshfallResult<MapData>> {
        if self.finished {
            return None;
        }
        let result = match self.receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Err(AshfallError::Loader(format!(
                "worker for {} exited without a result",
                self.path.display()
            ))),
        };
        self.finished = true;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Map loader thread panicked");
            }
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MAP: &str = r#"{
        "width": 640,
        "height": 360,
        "player_spawn": { "left": 32, "top": 200, "width": 24, "height": 48 },
        "walls": [ { "left": 0, "top": 320, "width": 640, "height": 40 } ]
    }"#;

    fn wait(loader: &mut MapLoader) -> AshfallResult<MapData> {
        loop {
            if let Some(result) = loader.poll(Duration::from_millis(50)) {
                return result;
            }
        }
    }

    #[test]
    fn test_loads_in_background() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("level.json");
        fs::write(&path, MAP).expect("write");

        let mut loader = MapLoader::spawn(&path).expect("spawn");
        let data = wait(&mut loader).expect("parses");
        assert_eq!(data.walls.len(), 1);
        assert!(loader.poll(Duration::ZERO).is_none());
    }

    #[test]
    fn test_missing_file_reports_io() {
        let mut loader = MapLoader::spawn("/nonexistent/level.json").expect("spawn");
        assert!(matches!(wait(&mut loader), Err(AshfallError::Io(_))));
    }

    #[test]
    fn test_bad_json_reports_map_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("level.json");
        fs::write(&path, "{ \"width\": ").expect("write");

        let mut loader = MapLoader::spawn(&path).expect("spawn");
        assert!(matches!(wait(&mut loader), Err(AshfallError::Map(_))));
    }
}
