//! Checkpoint storage for revocation sweeps.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::TrstError;
use crate::revocation::RevocationEngine;

/// Where sweep progress is checkpointed between bounded steps.
pub trait RevocationJournal: Send {
    fn save(&mut self, checkpoint: &RevocationEngine) -> Result<(), TrstError>;
    fn load(&self) -> Result<Option<RevocationEngine>, TrstError>;
    fn clear(&mut self) -> Result<(), TrstError>;
}

fn encode(checkpoint: &RevocationEngine) -> Result<Vec<u8>, TrstError> {
    bincode::serialize(checkpoint).map_err(|e| TrstError::Journal(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<RevocationEngine, TrstError> {
    bincode::deserialize(bytes).map_err(|e| TrstError::Journal(e.to_string()))
}

/// Keeps the latest checkpoint in memory. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    latest: Option<Vec<u8>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationJournal for MemoryJournal {
    fn save(&mut self, checkpoint: &RevocationEngine) -> Result<(), TrstError> {
        self.latest = Some(encode(checkpoint)?);
        Ok(())
    }

    fn load(&self) -> Result<Option<RevocationEngine>, TrstError> {
        self.latest.as_deref().map(decode).transpose()
    }

    fn clear(&mut self) -> Result<(), TrstError> {
        self.latest = None;
        Ok(())
    }
}

/// Writes the checkpoint to a single file, replaced atomically via rename.
#[derive(Debug, Clone)]
pub struct FileJournal {
    path: PathBuf,
}

impl FileJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl RevocationJournal for FileJournal {
    fn save(&mut self, checkpoint: &RevocationEngine) -> Result<(), TrstError> {
        let bytes = encode(checkpoint)?;
        let staging = self.staging_path();
        fs::write(&staging, bytes).map_err(|e| TrstError::Journal(e.to_string()))?;
        fs::rename(&staging, &self.path).map_err(|e| TrstError::Journal(e.to_string()))
    }

    fn load(&self) -> Result<Option<RevocationEngine>, TrstError> {
        match fs::read(&self.path) {
            Ok(bytes) => decode(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrstError::Journal(e.to_string())),
        }
    }

    fn clear(&mut self) -> Result<(), TrstError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrstError::Journal(e.to_string())),
        }
    }
}
