//! The persisted venue catalog.
//!
//! An ordered list of [`VenueRecord`]s unique by `(name, address)`, also on
//! load. Ids are positional and rewritten on every save. Writes go to a temp
//! file in the target directory and are renamed into place.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use tubemap_common::{CatalogError, CatalogKey, VenueRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(u32),
    /// The key is already present; nothing was written.
    Conflict { existing_id: u32 },
}

/// Fields enrichment and verification passes may change in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenuePatch {
    pub image_url: Option<Option<String>>,
    pub google_place_id: Option<Option<String>>,
    pub description: Option<String>,
    pub media: Option<String>,
    pub verified_score: Option<i32>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl VenuePatch {
    fn apply(self, record: &mut VenueRecord) {
        if let Some(v) = self.image_url {
            record.image_url = v;
        }
        if let Some(v) = self.google_place_id {
            record.google_place_id = v;
        }
        if let Some(v) = self.description {
            record.description = v;
        }
        if let Some(v) = self.media {
            record.media = v;
        }
        if let Some(v) = self.verified_score {
            record.verified_score = Some(v);
        }
        if let Some(v) = self.verified_at {
            record.verified_at = Some(v);
        }
    }
}

#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    records: Vec<VenueRecord>,
    dirty: bool,
}

impl Catalog {
    /// Load the catalog at `path`. A missing file is an empty catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let records = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice::<Vec<VenueRecord>>(&bytes).map_err(|source| {
                CatalogError::Corrupt {
                    path: path.to_path_buf(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No catalog yet, starting empty");
                Vec::new()
            }
            Err(source) => {
                return Err(CatalogError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        info!(path = %path.display(), records = records.len(), "Catalog loaded");
        Ok(Self::from_records(path, records))
    }

    /// Ids in hand-edited files may be stale, so they are made positional
    /// up front. Later records repeating an earlier key are dropped and the
    /// catalog is marked dirty.
    pub fn from_records(path: &Path, records: Vec<VenueRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let total = records.len();
        let records: Vec<VenueRecord> = records
            .into_iter()
            .filter(|r| {
                let fresh = seen.insert(r.key());
                if !fresh {
                    warn!(
                        id = r.id,
                        name = %r.name,
                        address = %r.address,
                        "Dropping duplicate catalog record"
                    );
                }
                fresh
            })
            .collect();

        let mut catalog = Self {
            path: path.to_path_buf(),
            dirty: records.len() != total,
            records,
        };
        catalog.reassign_numbers();
        catalog
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True once any insert, update or delete has touched the catalog.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn records(&self) -> &[VenueRecord] {
        &self.records
    }

    pub fn keys(&self) -> impl Iterator<Item = CatalogKey> + '_ {
        self.records.iter().map(VenueRecord::key)
    }

    pub fn find(&self, key: &CatalogKey) -> Option<&VenueRecord> {
        self.records.iter().find(|r| &r.key() == key)
    }

    /// Append `record` unless its key exists. The new record gets an id
    /// above every current one.
    pub fn insert(&mut self, mut record: VenueRecord) -> InsertOutcome {
        if let Some(existing) = self.find(&record.key()) {
            return InsertOutcome::Conflict {
                existing_id: existing.id,
            };
        }
        let id = self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        record.id = id;
        debug!(id, name = %record.name, "Catalog insert");
        self.records.push(record);
        self.dirty = true;
        InsertOutcome::Inserted(id)
    }

    /// Returns false when no record has this id.
    pub fn update(&mut self, id: u32, patch: VenuePatch) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                patch.apply(record);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Remove by id. Remaining records keep their relative order; ids are
    /// not re-densified until [`Catalog::reassign_numbers`] or a save.
    pub fn delete(&mut self, id: u32) -> Option<VenueRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        self.dirty = true;
        Some(self.records.remove(idx))
    }

    /// Rewrite every id to its 1-based position.
    pub fn reassign_numbers(&mut self) {
        for (i, record) in self.records.iter_mut().enumerate() {
            record.id = i as u32 + 1;
        }
    }

    /// Reassign ids, then atomically replace the file on disk.
    pub fn save(&mut self) -> Result<(), CatalogError> {
        self.reassign_numbers();

        let write_err = |message: String| CatalogError::Write {
            path: self.path.clone(),
            message,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| write_err(e.to_string()))?;

        let json =
            serde_json::to_string_pretty(&self.records).map_err(|e| write_err(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| write_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| write_err(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| write_err(e.error.to_string()))?;

        self.dirty = false;
        info!(path = %self.path.display(), records = self.records.len(), "Catalog saved");
        Ok(())
    }
}
