//! Durable on-disk vector collection.
//!
//! A collection is a directory holding two files:
//!
//! - `meta.json`: the dimension and metric the collection was created with
//! - `vectors.jsonl`: an append-only log, one `{"id", "vector"}` record per line
//!
//! On open the log is replayed into a [`MemoryIndex`]; later records for the
//! same id win. Inserts are buffered in memory and only reach the log on
//! [`flush`](VectorIndex::flush). A flush that fails partway cuts the log back
//! to where it started, and `meta.json` is replaced atomically through a
//! temporary file.

use super::memory_store::MemoryIndex;
use super::metric::Metric;
use super::store::{IndexError, Result, VectorIndex};
use super::types::DocumentId;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const META_FILE: &str = "meta.json";
const META_TMP_FILE: &str = "meta.json.tmp";
const DATA_FILE: &str = "vectors.jsonl";

#[derive(Debug, Serialize, Deserialize)]
struct CollectionMeta {
    dimension: usize,
    metric: Metric,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorRecord {
    id: DocumentId,
    vector: Vec<f32>,
}

/// A reopenable vector collection rooted at a directory.
pub struct DurableCollection {
    path: PathBuf,
    index: MemoryIndex,
    pending: Vec<VectorRecord>,
}

impl DurableCollection {
    /// Opens the collection at `path`, creating it if it does not exist.
    ///
    /// Opening an existing collection is idempotent and preserves its vectors.
    ///
    /// # Errors
    ///
    /// - [`IndexError::ConfigMismatch`] if the stored dimension or metric differ
    /// - [`IndexError::Corrupt`] if `meta.json` is unreadable, if it is missing
    ///   while the log holds records, or if a log record other than the last is
    ///   unreadable
    /// - [`IndexError::Io`] on filesystem failures
    pub fn open_or_create<P: AsRef<Path>>(path: P, dimension: usize, metric: Metric) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;

        let meta_path = path.join(META_FILE);
        let data_path = path.join(DATA_FILE);
        if meta_path.exists() {
            let meta = read_meta(&meta_path)?;
            if meta.dimension != dimension {
                return Err(IndexError::ConfigMismatch(format!(
                    "collection at {} has dimension {}, requested {}",
                    path.display(),
                    meta.dimension,
                    dimension
                )));
            }
            if meta.metric != metric {
                return Err(IndexError::ConfigMismatch(format!(
                    "collection at {} uses metric {}, requested {}",
                    path.display(),
                    meta.metric,
                    metric
                )));
            }
        } else if data_path.exists() && fs::metadata(&data_path)?.len() > 0 {
            return Err(IndexError::Corrupt(format!(
                "{} holds vectors but {} is missing",
                path.display(),
                META_FILE
            )));
        } else {
            write_meta(&path, &CollectionMeta { dimension, metric })?;
            debug!(path = %path.display(), dimension, %metric, "Created collection");
        }

        let mut index = MemoryIndex::new(metric, dimension);
        let replayed = replay(&data_path, &mut index)?;
        info!(path = %path.display(), records = replayed, vectors = index.len(), "Opened collection");

        Ok(Self {
            path,
            index,
            pending: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of inserts not yet written by [`flush`](VectorIndex::flush).
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Writes the pending records to `file` through `writer` and syncs it.
    ///
    /// On failure the log is truncated back to its length before the call and
    /// the records stay pending, so a retry never appends behind a fragment.
    fn append_pending<W: Write>(&mut self, file: &File, mut writer: W) -> Result<()> {
        let committed_len = file.metadata()?.len();

        let mut result = write_records(&mut writer, &self.pending);
        drop(writer);
        if result.is_ok() {
            result = file.sync_all().map_err(IndexError::from);
        }

        if let Err(e) = result {
            warn!(
                path = %self.path.display(),
                records = self.pending.len(),
                error = %e,
                "Flush failed, rolling back partial write"
            );
            file.set_len(committed_len)?;
            return Err(e);
        }

        debug!(path = %self.path.display(), records = self.pending.len(), "Flushed collection");
        self.pending.clear();
        Ok(())
    }
}

fn read_meta(meta_path: &Path) -> Result<CollectionMeta> {
    let contents = fs::read_to_string(meta_path)?;
    serde_json::from_str(&contents)
        .map_err(|e| IndexError::Corrupt(format!("{}: {}", meta_path.display(), e)))
}

/// Writes `meta.json` through a synced temporary file and a rename, so a crash
/// leaves either no metadata or complete metadata.
fn write_meta(dir: &Path, meta: &CollectionMeta) -> Result<()> {
    let tmp_path = dir.join(META_TMP_FILE);
    let file = File::create(&tmp_path)?;
    serde_json::to_writer_pretty(&file, meta)?;
    file.sync_all()?;
    fs::rename(&tmp_path, dir.join(META_FILE))?;
    // Directory sync is not available on every platform.
    if let Ok(handle) = File::open(dir) {
        if let Err(e) = handle.sync_all() {
            debug!(path = %dir.display(), error = %e, "Directory sync skipped");
        }
    }
    Ok(())
}

fn write_records<W: Write>(writer: &mut W, records: &[VectorRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Replays the log into `index`, returning the number of records applied.
///
/// An unreadable final line without a trailing newline is a write torn by a
/// crash: it is skipped and cut from the file so later appends stay aligned.
fn replay(data_path: &Path, index: &mut MemoryIndex) -> Result<usize> {
    if !data_path.exists() {
        return Ok(0);
    }

    let contents = fs::read_to_string(data_path)?;
    let mut applied = 0;
    let mut offset = 0;
    let mut lines = contents.split_inclusive('\n').enumerate().peekable();

    while let Some((line_no, line)) = lines.next() {
        let is_last = lines.peek().is_none();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            continue;
        }

        match serde_json::from_str::<VectorRecord>(trimmed) {
            Ok(record) => {
                index.insert(record.id, &record.vector)?;
                applied += 1;
                offset += line.len();
            }
            Err(e) if is_last && !line.ends_with('\n') => {
                warn!(
                    path = %data_path.display(),
                    line = line_no + 1,
                    error = %e,
                    "Skipping torn record at end of log"
                );
                OpenOptions::new()
                    .write(true)
                    .open(data_path)?
                    .set_len(offset as u64)?;
            }
            Err(e) => {
                return Err(IndexError::Corrupt(format!(
                    "{} line {}: {}",
                    data_path.display(),
                    line_no + 1,
                    e
                )));
            }
        }
    }

    Ok(applied)
}

impl VectorIndex for DurableCollection {
    fn insert(&mut self, id: DocumentId, vector: &[f32]) -> Result<()> {
        self.index.insert(id, vector)?;
        self.pending.push(VectorRecord {
            id,
            vector: vector.to_vec(),
        });
        Ok(())
    }

    fn search_where(
        &self,
        query: &[f32],
        k: usize,
        accept: &dyn Fn(DocumentId) -> bool,
    ) -> Result<Vec<(DocumentId, f32)>> {
        self.index.search_where(query, k, accept)
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.join(DATA_FILE))?;
        self.append_pending(&file, BufWriter::new(&file))
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn dimension(&self) -> usize {
        self.index.dimension()
    }

    fn metric(&self) -> Metric {
        self.index.metric()
    }
}

impl Drop for DurableCollection {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!(
                path = %self.path.display(),
                records = self.pending.len(),
                "Dropping collection with unflushed inserts"
            );
        }
    }
}
