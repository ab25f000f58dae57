//! Thin persistence collaborator: model buffers on disk.
//!
//! Models of one `(history, topology)` combination share a directory named
//! `<inputs>_<h1>_<h2>…` under the configured root; each model is a single
//! `<agent id>.bin` file holding the serialized buffer verbatim.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use crate::agent::AgentId;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("model storage failed at {}: {source}", path.display())]
pub struct StoreError {
    path: PathBuf,
    source: io::Error,
}

impl StoreError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_owned(),
            source,
        }
    }
}

/// One model directory, created on open.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Opens (and if needed creates) the directory for the given input
    /// width and hidden-layer sizes.
    pub fn open(root: &Path, inputs: usize, hidden_layers: &[usize]) -> Result<Self, StoreError> {
        let mut name = inputs.to_string();
        for size in hidden_layers {
            name.push('_');
            name.push_str(&size.to_string());
        }
        let dir = root.join(name);
        fs::create_dir_all(&dir).map_err(|e| StoreError::new(&dir, e))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads every `*.bin` buffer in the directory, ordered by filename so
    /// repeated loads see the models in the same order.
    pub fn load_all(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::new(&self.dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::new(&self.dir, e))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "bin") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut buffers = Vec::with_capacity(paths.len());
        for path in paths {
            buffers.push(fs::read(&path).map_err(|e| StoreError::new(&path, e))?);
        }
        Ok(buffers)
    }

    /// Persists one model buffer as `<id>.bin` and returns its path.
    pub fn save(&self, id: &AgentId, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(format!("{id}.bin"));
        fs::write(&path, bytes).map_err(|e| StoreError::new(&path, e))?;
        Ok(path)
    }
}
