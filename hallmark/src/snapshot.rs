//! Ledger state persistence.
//!
//! Whole-state snapshots in a compact binary format. The host decides when
//! to snapshot; anything mutated after the last save does not survive a
//! restart.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::ledger::HallmarkLedger;

/// Error during snapshot save/load
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),
}

impl HallmarkLedger {
    /// Write the full ledger state to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let file = File::create(path.as_ref())?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        info!(path = %path.as_ref().display(), "ledger snapshot saved");
        Ok(())
    }

    /// Load a previously saved ledger state.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let file = File::open(path.as_ref())?;
        let ledger = bincode::deserialize_from(BufReader::new(file))?;
        info!(path = %path.as_ref().display(), "ledger snapshot loaded");
        Ok(ledger)
    }
}
