//! Reference record-store importer
//!
//! Consumes the batched record stream with a rayon worker pool sized by
//! the caller's concurrency setting. Workers materialize and serialize
//! batches in parallel — each relationship worker over its own
//! concurrent snapshot copy — and stream them to a single writer thread
//! that restores chunk order before writing, so on-disk record order
//! always equals adjacency order regardless of worker interleaving.

use super::{
    BatchImporter, ImportStats, ImporterConfig, META_FILE, NODES_FILE, RELATIONSHIPS_FILE,
    STORE_FORMAT_VERSION, StoreMeta,
};
use crate::error::{Error, Result};
use crate::export::ImportInput;
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::PathBuf;

/// Reference bulk importer writing length-prefixed bincode batches
pub struct RecordStoreImporter {
    db_dir: PathBuf,
    db_name: String,
    config: ImporterConfig,
    stats: RwLock<ImportStats>,
}

impl RecordStoreImporter {
    /// Create an importer targeting `db_dir`
    pub fn new(db_dir: impl Into<PathBuf>, db_name: impl Into<String>, config: ImporterConfig) -> Self {
        Self {
            db_dir: db_dir.into(),
            db_name: db_name.into(),
            config,
            stats: RwLock::new(ImportStats::begin()),
        }
    }

    /// A snapshot of the current import statistics
    pub fn stats(&self) -> ImportStats {
        self.stats.read().clone()
    }

    fn buffer_capacity(&self) -> usize {
        ((self.config.page_cache_memory / 32) as usize).clamp(64 * 1024, 8 * 1024 * 1024)
    }

    /// Run one stage: fan chunks out to the pool, collect serialized
    /// batches on the writer thread in chunk order
    fn run_stage<S, I, M, A>(
        &self,
        pool: &rayon::ThreadPool,
        chunks: &[Range<u64>],
        file_name: &str,
        init: I,
        materialize: M,
        apply: A,
    ) -> Result<u64>
    where
        S: Send,
        I: Fn() -> S + Send + Sync,
        M: Fn(&mut S, Range<u64>) -> Result<(Vec<u8>, u64)> + Send + Sync,
        A: Fn(&mut ImportStats, u64) + Send + Sync,
    {
        let path = self.db_dir.join(file_name);
        let file = File::create(&path)?;
        let mut writer = BufWriter::with_capacity(self.buffer_capacity(), file);
        let (tx, rx) =
            crossbeam_channel::bounded::<(usize, Vec<u8>, u64)>(self.config.max_threads.max(1) * 2);
        let debug_log = self.config.debug_log;
        let high_io = self.config.high_io;
        let stats = &self.stats;
        let file_label = file_name.to_string();

        let (writer_result, worker_result) = std::thread::scope(|scope| {
            let writer_handle = scope.spawn(move || -> Result<u64> {
                let mut pending: BTreeMap<usize, (Vec<u8>, u64)> = BTreeMap::new();
                let mut next = 0usize;
                let mut records = 0u64;
                for (seq, bytes, count) in rx {
                    pending.insert(seq, (bytes, count));
                    while let Some((bytes, count)) = pending.remove(&next) {
                        writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
                        writer.write_all(&bytes)?;
                        records += count;
                        {
                            let mut guard = stats.write();
                            apply(&mut guard, count);
                        }
                        if debug_log {
                            tracing::debug!(
                                file = %file_label,
                                batch = next,
                                records = count,
                                "batch written"
                            );
                        }
                        next += 1;
                    }
                }
                writer.flush()?;
                if !high_io {
                    writer.get_ref().sync_all()?;
                }
                Ok(records)
            });

            let worker_result = pool.install(|| {
                chunks.par_iter().cloned().enumerate().try_for_each_init(
                    || (init(), tx.clone()),
                    |(state, tx), (seq, chunk)| -> Result<()> {
                        let (bytes, count) = materialize(state, chunk)?;
                        tx.send((seq, bytes, count))
                            .map_err(|_| Error::import("batch writer disconnected"))?;
                        Ok(())
                    },
                )
            });
            drop(tx);
            let writer_result = writer_handle
                .join()
                .unwrap_or_else(|_| Err(Error::import("batch writer thread panicked")));
            (writer_result, worker_result)
        });

        // a writer-side failure is the root cause when workers also saw
        // the channel close under them
        let records = writer_result?;
        worker_result?;
        Ok(records)
    }
}

impl BatchImporter for RecordStoreImporter {
    fn import(&self, input: &ImportInput<'_>) -> Result<ImportStats> {
        std::fs::create_dir_all(&self.db_dir)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_threads.max(1))
            .build()
            .map_err(|e| Error::import(format!("failed to build import worker pool: {e}")))?;
        *self.stats.write() = ImportStats::begin();
        let chunks = input.chunks();

        tracing::info!(
            db = %self.db_name,
            chunks = chunks.len(),
            threads = self.config.max_threads,
            "bulk import: node stage"
        );
        let node_count = self.run_stage(
            &pool,
            &chunks,
            NODES_FILE,
            || (),
            |_, chunk| encode_batch(&input.node_batch(chunk)),
            |stats, count| stats.nodes_imported += count,
        )?;

        tracing::info!(db = %self.db_name, "bulk import: relationship stage");
        let relationship_count = self.run_stage(
            &pool,
            &chunks,
            RELATIONSHIPS_FILE,
            || input.relationship_snapshot().concurrent_copy(),
            |snapshot, chunk| encode_batch(&input.relationship_batch(snapshot, chunk)?),
            |stats, count| stats.relationships_imported += count,
        )?;

        // the manifest is written last; its presence marks the store as
        // complete and arms the conflict check of later exports
        let meta = StoreMeta {
            format_version: STORE_FORMAT_VERSION,
            db_name: self.db_name.clone(),
            node_count,
            relationship_count,
        };
        let meta_file = File::create(self.db_dir.join(META_FILE))?;
        serde_json::to_writer_pretty(&meta_file, &meta)
            .map_err(|e| Error::serialization(e.to_string()))?;
        meta_file.sync_all()?;

        let mut stats = self.stats.write();
        stats.finish();
        Ok(stats.clone())
    }
}

fn encode_batch<T: Serialize>(batch: &[T]) -> Result<(Vec<u8>, u64)> {
    let bytes =
        bincode::serialize(batch).map_err(|e| Error::serialization(e.to_string()))?;
    Ok((bytes, batch.len() as u64))
}
