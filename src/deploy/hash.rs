use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use tracing::debug;

use crate::errors::Result;

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Content hashes of the artifacts deployed during this session.
///
/// Kept in memory only: a fresh session always deploys everything once.
#[derive(Debug, Default)]
pub struct ArtifactHashes {
    map: HashMap<PathBuf, String>,
}

impl ArtifactHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `path` and report whether it differs from the last recorded
    /// deploy. Returns the fresh hash so the caller can record it once the
    /// deploy actually succeeded.
    pub fn check(&self, path: &Path) -> Result<(bool, String)> {
        let hash = compute_file_hash(path)?;
        let changed = self.map.get(path) != Some(&hash);
        debug!(artifact = %path.display(), changed, "checked artifact hash");
        Ok((changed, hash))
    }

    pub fn record(&mut self, path: &Path, hash: String) {
        self.map.insert(path.to_path_buf(), hash);
    }
}
