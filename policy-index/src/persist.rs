//! On-disk index layout.
//!
//! ```text
//! <index_dir>/manifest.json   metadata, written last
//! <index_dir>/chunks.jsonl    one IndexedChunk per line
//! ```
//!
//! Writes never touch `<index_dir>` directly: files go to a hidden sibling
//! staging directory which is renamed into place once complete. Readers
//! therefore see either the previous index, the new one, or nothing.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DistanceKind;
use crate::errors::IndexError;
use crate::record::IndexedChunk;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHUNKS_FILE: &str = "chunks.jsonl";
pub const FORMAT_VERSION: u32 = 1;

/// Metadata describing a persisted index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub source_path: String,
    pub source_label: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub distance: DistanceKind,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunk_count: usize,
    pub page_count: usize,
    pub created_at: DateTime<Utc>,
}

/// True if `dir` exists and contains at least one entry.
///
/// This is the readiness contract: a non-empty directory is loaded, anything
/// else triggers ingestion. Atomic writes keep half-written directories from
/// ever appearing under this name.
pub fn index_ready(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

/// Writes the index into a staging directory and swaps it into `dir`.
///
/// An existing index at `dir` is moved aside before the swap and deleted after.
/// On any failure the staging directory is removed and `dir` is left untouched.
pub fn save_atomic(
    dir: &Path,
    manifest: &IndexManifest,
    entries: &[IndexedChunk],
) -> Result<(), IndexError> {
    let parent = parent_of(dir);
    fs::create_dir_all(&parent)?;

    let staging = sibling(dir, "staging");
    if let Err(e) = write_files(&staging, manifest, entries) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    let previous = if dir.exists() {
        let aside = sibling(dir, "previous");
        fs::rename(dir, &aside).inspect_err(|_| {
            let _ = fs::remove_dir_all(&staging);
        })?;
        Some(aside)
    } else {
        None
    };

    if let Err(e) = fs::rename(&staging, dir) {
        // Put the old index back so serving keeps working.
        if let Some(aside) = &previous {
            let _ = fs::rename(aside, dir);
        }
        let _ = fs::remove_dir_all(&staging);
        return Err(e.into());
    }
    sync_dir(&parent);

    if let Some(aside) = previous {
        if let Err(e) = fs::remove_dir_all(&aside) {
            warn!(path = %aside.display(), error = %e, "failed to remove previous index");
        }
    }

    info!(
        dir = %dir.display(),
        chunks = entries.len(),
        "index persisted"
    );
    Ok(())
}

/// Loads manifest and chunks from `dir`.
///
/// # Errors
/// - [`IndexError::IndexMissing`] if `dir` is absent or empty
/// - [`IndexError::Corrupt`] if files are missing, malformed, or disagree with the manifest
pub fn load(dir: &Path) -> Result<(IndexManifest, Vec<IndexedChunk>), IndexError> {
    if !index_ready(dir) {
        return Err(IndexError::IndexMissing(dir.to_path_buf()));
    }
    let corrupt = |reason: String| IndexError::Corrupt {
        path: dir.to_path_buf(),
        reason,
    };

    let manifest_path = dir.join(MANIFEST_FILE);
    let raw = fs::read_to_string(&manifest_path)
        .map_err(|e| corrupt(format!("cannot read {MANIFEST_FILE}: {e}")))?;
    let manifest: IndexManifest = serde_json::from_str(&raw)
        .map_err(|e| corrupt(format!("invalid {MANIFEST_FILE}: {e}")))?;
    if manifest.format_version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            manifest.format_version
        )));
    }

    let file = File::open(dir.join(CHUNKS_FILE))
        .map_err(|e| corrupt(format!("cannot open {CHUNKS_FILE}: {e}")))?;
    let mut entries = Vec::with_capacity(manifest.chunk_count);
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: IndexedChunk = serde_json::from_str(&line)
            .map_err(|e| corrupt(format!("{CHUNKS_FILE} line {}: {e}", i + 1)))?;
        if row.embedding.len() != manifest.dimension {
            return Err(corrupt(format!(
                "{CHUNKS_FILE} line {}: dimension {} != manifest {}",
                i + 1,
                row.embedding.len(),
                manifest.dimension
            )));
        }
        entries.push(row);
    }

    if entries.len() != manifest.chunk_count {
        return Err(corrupt(format!(
            "manifest lists {} chunks, found {}",
            manifest.chunk_count,
            entries.len()
        )));
    }

    debug!(dir = %dir.display(), chunks = entries.len(), "index loaded");
    Ok((manifest, entries))
}

fn write_files(
    staging: &Path,
    manifest: &IndexManifest,
    entries: &[IndexedChunk],
) -> Result<(), IndexError> {
    fs::create_dir(staging)?;

    let chunks = File::create(staging.join(CHUNKS_FILE))?;
    let mut w = BufWriter::new(chunks);
    for e in entries {
        serde_json::to_writer(&mut w, e)?;
        w.write_all(b"\n")?;
    }
    let chunks = w.into_inner().map_err(|e| e.into_error())?;
    chunks.sync_all()?;

    let manifest_file = File::create(staging.join(MANIFEST_FILE))?;
    let mut w = BufWriter::new(manifest_file);
    serde_json::to_writer_pretty(&mut w, manifest)?;
    w.write_all(b"\n")?;
    let manifest_file = w.into_inner().map_err(|e| e.into_error())?;
    manifest_file.sync_all()?;

    sync_dir(staging);
    Ok(())
}

/// Exclusive marker preventing two ingestion runs on the same index.
///
/// Removed on drop. A crashed run leaves the file behind; the error message
/// names it so an operator can delete it.
#[derive(Debug)]
pub struct IngestLock {
    path: PathBuf,
}

impl IngestLock {
    pub fn acquire(dir: &Path) -> Result<Self, IndexError> {
        let parent = parent_of(dir);
        fs::create_dir_all(&parent)?;
        let path = lock_path(dir);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut f) => {
                let _ = writeln!(f, "pid={} started={}", std::process::id(), Utc::now().to_rfc3339());
                debug!(lock = %path.display(), "ingest lock acquired");
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(IndexError::IngestionInProgress(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for IngestLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to release ingest lock");
        }
    }
}

/// `<parent>/<name>.lock`
pub fn lock_path(dir: &Path) -> PathBuf {
    let name = dir_name(dir);
    parent_of(dir).join(format!("{name}.lock"))
}

/// `<parent>/.<name>.<tag>-<uuid>`
fn sibling(dir: &Path, tag: &str) -> PathBuf {
    let name = dir_name(dir);
    parent_of(dir).join(format!(".{name}.{tag}-{}", uuid::Uuid::new_v4().simple()))
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".into())
}

fn parent_of(dir: &Path) -> PathBuf {
    match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(f) = File::open(dir) {
        let _ = f.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DocumentChunk;

    fn manifest(count: usize) -> IndexManifest {
        IndexManifest {
            format_version: FORMAT_VERSION,
            source_path: "doc.pdf".into(),
            source_label: "HR".into(),
            embedding_model: "fake".into(),
            dimension: 2,
            distance: DistanceKind::Cosine,
            chunk_size: 800,
            chunk_overlap: 150,
            chunk_count: count,
            page_count: 1,
            created_at: Utc::now(),
        }
    }

    fn rows(n: usize) -> Vec<IndexedChunk> {
        (0..n)
            .map(|i| IndexedChunk {
                chunk: DocumentChunk {
                    id: format!("id{i}"),
                    seq: i,
                    page: 1,
                    text: format!("text {i}"),
                    source: "HR".into(),
                },
                embedding: vec![i as f32, 1.0],
            })
            .collect()
    }

    fn leftovers(parent: &Path) -> Vec<String> {
        fs::read_dir(parent)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with('.'))
            .collect()
    }

    #[test]
    fn readiness_requires_non_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("idx");
        assert!(!index_ready(&dir));
        fs::create_dir(&dir).unwrap();
        assert!(!index_ready(&dir));
        fs::write(dir.join("anything"), b"x").unwrap();
        assert!(index_ready(&dir));
    }

    #[test]
    fn save_replaces_existing_index_without_leftovers() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("idx");

        save_atomic(&dir, &manifest(2), &rows(2)).unwrap();
        save_atomic(&dir, &manifest(3), &rows(3)).unwrap();

        let (m, entries) = load(&dir).unwrap();
        assert_eq!(m.chunk_count, 3);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].chunk.text, "text 2");
        assert!(leftovers(tmp.path()).is_empty());
    }

    #[test]
    fn truncated_chunks_file_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("idx");
        save_atomic(&dir, &manifest(3), &rows(2)).unwrap();

        assert!(matches!(load(&dir), Err(IndexError::Corrupt { .. })));
    }

    #[test]
    fn missing_dir_is_reported_as_missing() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&tmp.path().join("nope")),
            Err(IndexError::IndexMissing(_))
        ));
    }

    #[test]
    fn lock_is_exclusive_and_released_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("idx");

        let first = IngestLock::acquire(&dir).unwrap();
        assert!(matches!(
            IngestLock::acquire(&dir),
            Err(IndexError::IngestionInProgress(_))
        ));
        drop(first);
        assert!(!lock_path(&dir).exists());
        assert!(IngestLock::acquire(&dir).is_ok());
    }
}
