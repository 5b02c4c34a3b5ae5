//! Reader over a completed record store
//!
//! Replays the manifest and the length-prefixed record batches written
//! by [`RecordStoreImporter`](super::RecordStoreImporter); used to
//! verify exports end to end.

use super::{META_FILE, NODES_FILE, RELATIONSHIPS_FILE, STORE_FORMAT_VERSION, StoreMeta};
use crate::error::{Error, Result};
use crate::export::{NodeRecord, RelationshipRecord};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Reader over one exported store directory
pub struct StoreReader {
    db_dir: PathBuf,
    meta: StoreMeta,
}

impl StoreReader {
    /// Open a store directory and load its manifest
    pub fn open(db_dir: impl Into<PathBuf>) -> Result<Self> {
        let db_dir = db_dir.into();
        let meta_file = File::open(db_dir.join(META_FILE))?;
        let meta: StoreMeta = serde_json::from_reader(BufReader::new(meta_file))
            .map_err(|e| Error::serialization(e.to_string()))?;
        if meta.format_version > STORE_FORMAT_VERSION {
            return Err(Error::import(format!(
                "store format version {} is newer than supported version {}",
                meta.format_version, STORE_FORMAT_VERSION
            )));
        }
        Ok(Self { db_dir, meta })
    }

    /// The store manifest
    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    /// All node records, in written order
    pub fn nodes(&self) -> Result<Vec<NodeRecord>> {
        read_batches(&self.db_dir.join(NODES_FILE))
    }

    /// All relationship records, in written order
    pub fn relationships(&self) -> Result<Vec<RelationshipRecord>> {
        read_batches(&self.db_dir.join(RELATIONSHIPS_FILE))
    }
}

fn read_batches<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    loop {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        let batch: Vec<T> =
            bincode::deserialize(&buf).map_err(|e| Error::serialization(e.to_string()))?;
        records.extend(batch);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_fails_without_manifest() {
        let dir = TempDir::new().unwrap();
        let result = StoreReader::open(dir.path());
        assert!(matches!(result, Err(Error::ImportIo(_))));
    }

    #[test]
    fn open_rejects_newer_format_versions() {
        let dir = TempDir::new().unwrap();
        let meta = StoreMeta {
            format_version: STORE_FORMAT_VERSION + 1,
            db_name: "db".into(),
            node_count: 0,
            relationship_count: 0,
        };
        std::fs::write(
            dir.path().join(META_FILE),
            serde_json::to_vec(&meta).unwrap(),
        )
        .unwrap();
        let result = StoreReader::open(dir.path());
        assert!(matches!(result, Err(Error::Import(_))));
    }
}
