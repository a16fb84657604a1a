//! Shared process resources handed to plugins at init time

use qcdriver_options::Environment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process group the computation runs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communicator {
    rank: usize,
    size: usize,
}

impl Communicator {
    /// Single-process communicator
    pub fn world() -> Self {
        Self { rank: 0, size: 1 }
    }

    /// Communicator for process `rank` of `size`
    pub fn new(rank: usize, size: usize) -> Self {
        Self {
            rank,
            size: size.max(1),
        }
    }

    /// This process's rank
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of processes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this process is rank zero
    pub fn is_root(&self) -> bool {
        self.rank == 0
    }
}

impl Default for Communicator {
    fn default() -> Self {
        Self::world()
    }
}

/// Location of the checkpoint file modules read and write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointBackend {
    path: PathBuf,
}

impl CheckpointBackend {
    /// Checkpoint stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoint file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Scratch file manager
///
/// Every scratch file lives in `scratch_dir` and is named `<namespace>.<unit>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoBackend {
    scratch_dir: PathBuf,
    namespace: String,
}

impl IoBackend {
    /// Scratch files under `scratch_dir`, prefixed by `namespace`
    pub fn new(scratch_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            namespace: namespace.into(),
        }
    }

    /// Scratch directory
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// File name prefix
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path of scratch unit `unit`
    pub fn file_path(&self, unit: &str) -> PathBuf {
        self.scratch_dir.join(format!("{}.{unit}", self.namespace))
    }

    /// Remove every scratch file in this namespace, returning how many were removed
    pub fn clean(&self) -> io::Result<usize> {
        self.clean_except(&[])
    }

    /// Like [`clean`](Self::clean), but leaves the files in `keep` in place
    pub fn clean_except(&self, keep: &[&Path]) -> io::Result<usize> {
        if !self.scratch_dir.is_dir() {
            return Ok(0);
        }

        let prefix = format!("{}.", self.namespace);
        let mut removed = 0;
        for entry in fs::read_dir(&self.scratch_dir)? {
            let entry = entry?;
            let is_ours = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(&prefix));
            let path = entry.path();
            if is_ours && !keep.contains(&path.as_path()) && entry.file_type()?.is_file() {
                fs::remove_file(&path)?;
                debug!(file = %path.display(), "Scratch file removed");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Everything a plugin receives at init time
#[derive(Debug, Clone, Copy)]
pub struct SharedResources<'a> {
    /// Process group
    pub communicator: &'a Communicator,
    /// Snapshot of the environment at init time
    pub environment: &'a Environment,
    /// Checkpoint location
    pub checkpoint: &'a CheckpointBackend,
    /// Scratch file manager
    pub io: &'a IoBackend,
}

/// Owned process resources, lent to plugins as [`SharedResources`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResources {
    /// Process group
    pub communicator: Communicator,
    /// Checkpoint location
    pub checkpoint: CheckpointBackend,
    /// Scratch file manager
    pub io: IoBackend,
}

impl ProcessResources {
    /// Single-process resources rooted in `scratch_dir`
    pub fn local(scratch_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        let io = IoBackend::new(scratch_dir, namespace);
        let checkpoint = CheckpointBackend::new(io.file_path("chk"));
        Self {
            communicator: Communicator::world(),
            checkpoint,
            io,
        }
    }

    /// Remove this job's scratch files, keeping the checkpoint
    pub fn clean_scratch(&self) -> io::Result<usize> {
        self.io.clean_except(&[self.checkpoint.path()])
    }

    /// Borrow the resources together with the current environment
    pub fn share<'a>(&'a self, environment: &'a Environment) -> SharedResources<'a> {
        SharedResources {
            communicator: &self.communicator,
            environment,
            checkpoint: &self.checkpoint,
            io: &self.io,
        }
    }
}
