//! Persistent line content index and commit metadata store.
//!
//! Both stores live in one redb database. The commit metadata and reference
//! tables together form the `META` record; the `lines` table maps
//! `"{path}:{line}"` to every exact text that line ever held and the commits
//! that held it.

use crate::error::{Result, TraceError};
use crate::scan::StagedCommit;
use crate::types::{CommitMeta, IndexMeta, IndexStats, LineEntry, LineKey};
use crate::CommitId;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Index schema version for migration support.
pub const INDEX_SCHEMA_VERSION: u32 = 1;

// Table definitions
const METADATA_TABLE: TableDefinition<&str, u32> = TableDefinition::new("metadata");
const COMMITS_TABLE: TableDefinition<&[u8; 20], &[u8]> = TableDefinition::new("commits");
const REFS_TABLE: TableDefinition<&str, &[u8; 20]> = TableDefinition::new("refs");
const LINES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("lines");

fn storage<E: Display>(what: &'static str) -> impl FnOnce(E) -> TraceError {
    move |e| TraceError::Storage(format!("{}: {}", what, e))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(value).map_err(|e| TraceError::Serialization(e.to_string()))
}

fn decode<'a, T: serde::Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    postcard::from_bytes(bytes).map_err(|e| TraceError::Deserialization(e.to_string()))
}

/// Owned handle on the index database.
///
/// The database file stays locked for as long as the handle lives; drop it
/// to release the file. Only one handle may be open on a file at a time.
pub struct Index {
    db: Database,
    path: PathBuf,
}

impl Index {
    /// Opens an existing index database.
    ///
    /// Returns `None` if the index doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database exists but can't be opened or has a
    /// schema version mismatch.
    pub fn open(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(None);
        }

        let db = Database::open(&path).map_err(storage("failed to open index"))?;

        let read_txn = db.begin_read().map_err(storage("failed to begin read transaction"))?;
        let table = read_txn
            .open_table(METADATA_TABLE)
            .map_err(|e| TraceError::IndexCorrupted {
                message: format!("missing metadata table: {}", e),
            })?;
        let version = table
            .get("version")
            .map_err(storage("failed to read schema version"))?
            .map(|v| v.value());
        if version != Some(INDEX_SCHEMA_VERSION) {
            return Err(TraceError::IndexCorrupted {
                message: format!(
                    "schema version mismatch: found {:?}, expected {}",
                    version, INDEX_SCHEMA_VERSION
                ),
            });
        }
        drop(table);
        drop(read_txn);

        Ok(Some(Self { db, path }))
    }

    /// Creates a new, empty index database.
    ///
    /// Overwrites any existing database at the path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let db = Database::create(&path).map_err(storage("failed to create index"))?;

        let write_txn = db.begin_write().map_err(storage("failed to begin write transaction"))?;
        {
            let mut table = write_txn
                .open_table(METADATA_TABLE)
                .map_err(storage("failed to open metadata table"))?;
            table
                .insert("version", INDEX_SCHEMA_VERSION)
                .map_err(storage("failed to insert version"))?;
            write_txn
                .open_table(COMMITS_TABLE)
                .map_err(storage("failed to create commits table"))?;
            write_txn
                .open_table(REFS_TABLE)
                .map_err(storage("failed to create refs table"))?;
            write_txn
                .open_table(LINES_TABLE)
                .map_err(storage("failed to create lines table"))?;
        }
        write_txn.commit().map_err(storage("failed to commit"))?;

        Ok(Self { db, path })
    }

    /// Opens the index at `path`, creating an empty one if none exists.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        match Self::open(path.as_ref())? {
            Some(index) => Ok(index),
            None => Self::create(path),
        }
    }

    /// Returns the path to the index database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full `META` record: every reference and every commit's metadata.
    pub fn meta(&self) -> Result<IndexMeta> {
        let read_txn = self.begin_read()?;

        let mut commits = BTreeMap::new();
        let table = read_txn
            .open_table(COMMITS_TABLE)
            .map_err(storage("failed to open commits table"))?;
        for entry in table.iter().map_err(storage("failed to iterate commits"))? {
            let (key, value) = entry.map_err(storage("failed to read commit"))?;
            let meta: CommitMeta = decode(value.value())?;
            commits.insert(CommitId::from_bytes(*key.value()), meta);
        }

        Ok(IndexMeta {
            refs: self.refs()?,
            commits,
        })
    }

    /// Loads the reference mapping.
    pub fn refs(&self) -> Result<BTreeMap<String, CommitId>> {
        let read_txn = self.begin_read()?;
        let table = read_txn
            .open_table(REFS_TABLE)
            .map_err(storage("failed to open refs table"))?;

        let mut refs = BTreeMap::new();
        for entry in table.iter().map_err(storage("failed to iterate refs"))? {
            let (key, value) = entry.map_err(storage("failed to read ref"))?;
            refs.insert(key.value().to_string(), CommitId::from_bytes(*value.value()));
        }
        Ok(refs)
    }

    /// Returns true if the commit has already been indexed.
    pub fn contains_commit(&self, id: &CommitId) -> Result<bool> {
        Ok(self.commit_meta(id)?.is_some())
    }

    /// Metadata of one commit.
    pub fn commit_meta(&self, id: &CommitId) -> Result<Option<CommitMeta>> {
        let read_txn = self.begin_read()?;
        let table = read_txn
            .open_table(COMMITS_TABLE)
            .map_err(storage("failed to open commits table"))?;

        match table.get(id.as_bytes()).map_err(storage("failed to get commit"))? {
            Some(bytes) => Ok(Some(decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// Ids of every indexed commit, in id order.
    pub fn commit_ids(&self) -> Result<Vec<CommitId>> {
        let read_txn = self.begin_read()?;
        let table = read_txn
            .open_table(COMMITS_TABLE)
            .map_err(storage("failed to open commits table"))?;

        let mut ids = Vec::new();
        for entry in table.iter().map_err(storage("failed to iterate commits"))? {
            let (key, _) = entry.map_err(storage("failed to read commit"))?;
            ids.push(CommitId::from_bytes(*key.value()));
        }
        Ok(ids)
    }

    /// Every text the line at `key` held, with the commits that held it.
    pub fn line_entry(&self, key: &LineKey) -> Result<Option<LineEntry>> {
        let read_txn = self.begin_read()?;
        let table = read_txn
            .open_table(LINES_TABLE)
            .map_err(storage("failed to open lines table"))?;

        let key = key.to_string();
        match table.get(key.as_str()).map_err(storage("failed to get line"))? {
            Some(bytes) => Ok(Some(decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// Merges one scanned commit into the index.
    ///
    /// The staged lines and the commit's metadata are written in a single
    /// transaction, so a commit is either fully indexed or not at all.
    /// Commit id sets only ever grow.
    pub fn store_commit(
        &mut self,
        id: CommitId,
        meta: &CommitMeta,
        staged: &StagedCommit,
    ) -> Result<()> {
        let write_txn = self.begin_write()?;

        {
            let mut table = write_txn
                .open_table(LINES_TABLE)
                .map_err(storage("failed to open lines table"))?;
            for (key, content) in staged.lines() {
                let key = key.to_string();
                let mut entry: LineEntry = match table
                    .get(key.as_str())
                    .map_err(storage("failed to get line"))?
                {
                    Some(bytes) => decode(bytes.value())?,
                    None => LineEntry::new(),
                };
                if !entry.entry(content.to_string()).or_default().insert(id) {
                    continue;
                }
                let value = encode(&entry)?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(storage("failed to insert line"))?;
            }
        }

        {
            let mut table = write_txn
                .open_table(COMMITS_TABLE)
                .map_err(storage("failed to open commits table"))?;
            let value = encode(meta)?;
            table
                .insert(id.as_bytes(), value.as_slice())
                .map_err(storage("failed to insert commit"))?;
        }

        write_txn.commit().map_err(storage("failed to commit"))?;
        debug!(commit = %id.short(), lines = staged.line_count(), "merged commit");
        Ok(())
    }

    /// Replaces the metadata of the given commits wholesale.
    ///
    /// Returns false, without opening a write transaction, if every value
    /// is already stored as given.
    pub fn replace_commit_metas(&mut self, metas: &BTreeMap<CommitId, CommitMeta>) -> Result<bool> {
        let mut changed = Vec::new();
        for (id, meta) in metas {
            if self.commit_meta(id)?.as_ref() != Some(meta) {
                changed.push((id, meta));
            }
        }
        if changed.is_empty() {
            return Ok(false);
        }

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn
                .open_table(COMMITS_TABLE)
                .map_err(storage("failed to open commits table"))?;
            for (id, meta) in changed {
                let value = encode(meta)?;
                table
                    .insert(id.as_bytes(), value.as_slice())
                    .map_err(storage("failed to insert commit"))?;
            }
        }
        write_txn.commit().map_err(storage("failed to commit"))?;
        Ok(true)
    }

    /// Replaces the whole reference mapping; vanished references are dropped.
    ///
    /// Returns false, without opening a write transaction, if the mapping is
    /// unchanged.
    pub fn replace_refs(&mut self, refs: &BTreeMap<String, CommitId>) -> Result<bool> {
        if &self.refs()? == refs {
            return Ok(false);
        }

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn
                .open_table(REFS_TABLE)
                .map_err(storage("failed to open refs table"))?;

            let mut stale = Vec::new();
            for entry in table.iter().map_err(storage("failed to iterate refs"))? {
                let (key, _) = entry.map_err(storage("failed to read ref"))?;
                stale.push(key.value().to_string());
            }
            for name in &stale {
                table
                    .remove(name.as_str())
                    .map_err(storage("failed to remove ref"))?;
            }

            for (name, id) in refs {
                table
                    .insert(name.as_str(), id.as_bytes())
                    .map_err(storage("failed to insert ref"))?;
            }
        }
        write_txn.commit().map_err(storage("failed to commit"))?;
        Ok(true)
    }

    /// Summary counts.
    pub fn stats(&self) -> Result<IndexStats> {
        let read_txn = self.begin_read()?;
        let commits = read_txn
            .open_table(COMMITS_TABLE)
            .map_err(storage("failed to open commits table"))?
            .len()
            .map_err(storage("failed to count commits"))?;
        let refs = read_txn
            .open_table(REFS_TABLE)
            .map_err(storage("failed to open refs table"))?
            .len()
            .map_err(storage("failed to count refs"))?;
        let line_keys = read_txn
            .open_table(LINES_TABLE)
            .map_err(storage("failed to open lines table"))?
            .len()
            .map_err(storage("failed to count lines"))?;

        Ok(IndexStats {
            commits: commits as usize,
            refs: refs as usize,
            line_keys: line_keys as usize,
        })
    }

    fn begin_read(&self) -> Result<redb::ReadTransaction> {
        self.db
            .begin_read()
            .map_err(storage("failed to begin read transaction"))
    }

    fn begin_write(&self) -> Result<redb::WriteTransaction> {
        self.db
            .begin_write()
            .map_err(storage("failed to begin write transaction"))
    }
}
