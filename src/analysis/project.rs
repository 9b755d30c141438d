use crate::config::Config;
use crate::discovery::FileFinder;
use crate::symbol::{IndexBuilder, SymbolIndex};
use miette::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock, RwLockReadGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Lifecycle of the background project index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    Pending,
    Indexing,
    Ready,
    Failed(String),
}

/// A project root with its parsed files and symbol index.
///
/// Analysis runs hold the read guard for their whole duration; file updates
/// take the write guard.
pub struct Project {
    root: PathBuf,
    config: Config,
    index: RwLock<SymbolIndex>,
    state: Mutex<IndexState>,
    ready: Condvar,
}

impl Project {
    pub fn new(root: &Path, config: Config) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            index: RwLock::new(SymbolIndex::new()),
            state: Mutex::new(IndexState::Pending),
            ready: Condvar::new(),
        }
    }

    /// A project indexed from in-memory sources, ready immediately
    pub fn from_sources(root: &Path, config: Config, sources: Vec<(PathBuf, String)>) -> Self {
        let project = Self::new(root, config);
        let index = IndexBuilder::new(&project.config, &project.root).build_from_sources(sources);
        *project.index.write().unwrap_or_else(PoisonError::into_inner) = index;
        project.set_state(IndexState::Ready);
        project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index_state(&self) -> IndexState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_index_ready(&self) -> bool {
        self.index_state() == IndexState::Ready
    }

    fn set_state(&self, state: IndexState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        self.ready.notify_all();
    }

    /// Discover and index every project file on the calling thread
    pub fn index_now(&self) -> Result<()> {
        self.set_state(IndexState::Indexing);
        let start = Instant::now();

        let built = FileFinder::new(&self.config)
            .find_files(&self.root)
            .and_then(|files| {
                info!("Found {} files to index", files.len());
                IndexBuilder::new(&self.config, &self.root).build_from_files(&files)
            });

        match built {
            Ok(index) => {
                *self.index.write().unwrap_or_else(PoisonError::into_inner) = index;
                info!("Index ready in {:.2}s", start.elapsed().as_secs_f64());
                self.set_state(IndexState::Ready);
                Ok(())
            }
            Err(e) => {
                self.set_state(IndexState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Index on a background thread. The state is `Indexing` when this returns.
    pub fn begin_indexing(self: &Arc<Self>) -> JoinHandle<()> {
        self.set_state(IndexState::Indexing);
        let project = Arc::clone(self);
        thread::spawn(move || {
            if let Err(e) = project.index_now() {
                warn!("Indexing failed: {}", e);
            }
        })
    }

    /// Block until indexing settles or `timeout` passes; true when ready
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (state, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |state| {
                matches!(state, IndexState::Pending | IndexState::Indexing)
            })
            .unwrap_or_else(PoisonError::into_inner);
        *state == IndexState::Ready
    }

    /// Consistent read-only view of every parsed file
    pub fn read(&self) -> RwLockReadGuard<'_, SymbolIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-parse one file in place, or add it when it is new
    pub fn update_file(&self, path: &Path, text: String) -> Result<()> {
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        let id = index
            .unit_for_path(path)
            .map(|unit| unit.id)
            .unwrap_or_else(|| index.next_file_id());
        let (unit, symbols) = IndexBuilder::new(&self.config, &self.root).parse_unit(id, path, text)?;
        index.replace_unit(unit, symbols);
        Ok(())
    }
}
