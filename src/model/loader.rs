//! Background model loading.
//!
//! Large files are parsed on a named worker thread so the render loop keeps
//! drawing the loading view. The worker only does CPU work (OBJ parsing and
//! image decoding); the render thread uploads to the GPU on the first frame
//! after it sees the loaded flag.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::ViewerError;
use crate::model::ModelData;

/// Files larger than this many bytes load on a background thread.
pub const DEFAULT_BACKGROUND_THRESHOLD: u64 = 1_000_000;

/// Owns at most one in-flight model load.
///
/// Dropping the loader joins the worker. Starting a new load joins the
/// previous worker and discards its result.
pub struct ModelLoader {
    threshold: u64,
    loaded: Arc<AtomicBool>,
    worker: Option<JoinHandle<Option<ModelData>>>,
    ready: Option<ModelData>,
}

impl ModelLoader {
    /// Loader that backgrounds files larger than `threshold` bytes.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            loaded: Arc::new(AtomicBool::new(false)),
            worker: None,
            ready: None,
        }
    }

    /// Start loading `path`.
    ///
    /// Small files are parsed before this returns. Parse failures of a
    /// background load are only logged; the loaded flag then stays false.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Io`] if the file cannot be stat'ed,
    /// [`ViewerError::ThreadSpawn`] if the worker cannot start, or the
    /// parse error of a small file.
    pub fn load(&mut self, path: &Path) -> Result<(), ViewerError> {
        if let Some(previous) = self.worker.take() {
            log::debug!("joining previous model load");
            drop(join_worker(previous));
        }
        self.ready = None;
        self.loaded = Arc::new(AtomicBool::new(false));

        let size = std::fs::metadata(path)?.len();
        if size <= self.threshold {
            log::info!("loading {} ({size} bytes)", path.display());
            let data = ModelData::load_obj(path)?;
            self.ready = Some(data);
            self.loaded.store(true, Ordering::Release);
            return Ok(());
        }

        log::info!(
            "loading {} ({size} bytes) in the background",
            path.display()
        );
        let loaded = Arc::clone(&self.loaded);
        let path: PathBuf = path.to_path_buf();
        let worker = std::thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || match ModelData::load_obj(&path) {
                Ok(data) => {
                    loaded.store(true, Ordering::Release);
                    Some(data)
                }
                Err(e) => {
                    log::error!("background load failed: {e}");
                    None
                }
            })
            .map_err(ViewerError::ThreadSpawn)?;
        self.worker = Some(worker);
        Ok(())
    }

    /// `true` once the current load has produced a model.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// `true` while a background worker has not been collected.
    pub fn is_pending(&self) -> bool {
        self.worker.is_some()
    }

    /// Take the loaded model, if the load has finished. Returns `Some`
    /// exactly once per successful load and never blocks on a running
    /// worker.
    pub fn take(&mut self) -> Option<ModelData> {
        if self.ready.is_none() && self.is_loaded() {
            if let Some(worker) = self.worker.take() {
                self.ready = join_worker(worker);
            }
        }
        self.ready.take()
    }

    /// Block until the current load finishes and take its result.
    pub fn wait(&mut self) -> Option<ModelData> {
        if let Some(worker) = self.worker.take() {
            self.ready = join_worker(worker);
        }
        self.ready.take()
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND_THRESHOLD)
    }
}

impl Drop for ModelLoader {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            drop(join_worker(worker));
        }
    }
}

fn join_worker(worker: JoinHandle<Option<ModelData>>) -> Option<ModelData> {
    match worker.join() {
        Ok(result) => result,
        Err(_) => {
            log::error!("model loader thread panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const TRIANGLE: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("instaview-{}-{name}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn small_files_load_inline() {
        let path = temp_file("inline.obj", TRIANGLE);
        let mut loader = ModelLoader::new(1_000_000);
        loader.load(&path).unwrap();
        assert!(loader.is_loaded());
        assert!(!loader.is_pending());
        let model = loader.take().unwrap();
        assert_eq!(model.vertex_count(), 3);
        assert!(loader.take().is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn large_files_load_in_background() {
        let path = temp_file("background.obj", TRIANGLE);
        let mut loader = ModelLoader::new(0);
        loader.load(&path).unwrap();
        assert!(loader.is_pending());
        let model = loader.wait().unwrap();
        assert!((model.width() - 1.0).abs() < 1e-6);
        assert!(loader.is_loaded());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn background_failure_leaves_flag_false() {
        let path = temp_file("garbage.obj", "this is not an obj file\n");
        let mut loader = ModelLoader::new(0);
        loader.load(&path).unwrap();
        assert!(loader.wait().is_none());
        assert!(!loader.is_loaded());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn new_load_discards_previous() {
        let first = temp_file("first.obj", TRIANGLE);
        let second = temp_file("second.obj", TRIANGLE);
        let mut loader = ModelLoader::new(0);
        loader.load(&first).unwrap();
        loader.load(&second).unwrap();
        // Only the second load's result is observable.
        assert!(loader.wait().is_some());
        assert!(loader.wait().is_none());
        let _ = std::fs::remove_file(first);
        let _ = std::fs::remove_file(second);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut loader = ModelLoader::default();
        let err = loader.load(Path::new("/nonexistent/instaview.obj"));
        assert!(matches!(err, Err(ViewerError::Io(_))));
    }

    #[test]
    fn drop_joins_running_worker() {
        let path = temp_file("drop.obj", TRIANGLE);
        let mut loader = ModelLoader::new(0);
        loader.load(&path).unwrap();
        drop(loader);
        let _ = std::fs::remove_file(path);
    }
}
