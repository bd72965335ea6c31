use crate::block::{Record, RecordError, RecordPayload};
use crate::persistence::error::save_error;
use crate::persistence::{PersistenceResult, RegionStorage};
use crate::world::{BlockMap, BlockPos, ChunkPos};

/// Cached state of one region: its document and an explicit dirty flag
#[derive(Debug)]
pub struct RegionStorageEntry {
    storage: RegionStorage,
    dirty: bool,
}

impl RegionStorageEntry {
    pub fn new(storage: RegionStorage) -> Self {
        Self {
            storage,
            dirty: false,
        }
    }

    pub fn storage(&self) -> &RegionStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut RegionStorage {
        &mut self.storage
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// The explicit flag only, ignoring resident records
    pub fn is_marked_dirty(&self) -> bool {
        self.dirty
    }

    /// Dirty if marked, or if any resident record inside the region is dirty
    pub fn is_dirty<P: RecordPayload>(&self, records: &BlockMap<Record<P>>) -> bool {
        self.dirty
            || self.storage.region().any_chunk_match(|chunk| {
                records.get_chunk(chunk).iter().any(|record| record.is_dirty())
            })
    }

    /// Clear the explicit flag and every resident record's flag
    pub fn clean<P: RecordPayload>(&mut self, records: &mut BlockMap<Record<P>>) {
        self.dirty = false;
        self.storage
            .region()
            .for_each_chunk(|chunk| records.for_each_in_chunk_mut(chunk, Record::mark_clean));
    }

    /// Store a record's block section in the document. The document is left
    /// unchanged if the payload cannot be serialized.
    pub fn write_record<P: RecordPayload>(&mut self, record: &Record<P>) -> Result<(), RecordError> {
        let section = record.to_section()?;
        let position = record.position();
        let chunk_key = position.chunk().storage_key();
        let block_key = position.storage_key();
        self.storage
            .root_mut()
            .set_path(&[chunk_key.as_str(), block_key.as_str()], section);
        Ok(())
    }

    /// Drop a block section from the document. Returns whether one existed.
    pub fn remove_record(&mut self, position: &BlockPos) -> bool {
        let chunk_key = position.chunk().storage_key();
        let block_key = position.storage_key();
        self.storage
            .root_mut()
            .remove_path(&[chunk_key.as_str(), block_key.as_str()])
            .is_some()
    }

    /// Remove top-level sections whose key is not the canonical key of a
    /// chunk inside this region, returning the removed keys
    pub fn prune_foreign_chunks(&mut self) -> Vec<String> {
        let region = self.storage.region().clone();
        let foreign: Vec<String> = self
            .storage
            .root()
            .keys()
            .filter(|key| {
                !ChunkPos::parse_storage_key(&region.world, key)
                    .is_some_and(|chunk| region.contains_chunk(&chunk))
            })
            .map(str::to_string)
            .collect();

        let root = self.storage.root_mut();
        for key in &foreign {
            root.remove(key);
        }
        if !foreign.is_empty() {
            self.dirty = true;
        }
        foreign
    }

    /// Serialize dirty resident records into the document, save it, and
    /// clean on success. On failure the entry stays dirty.
    pub fn flush<P: RecordPayload>(
        &mut self,
        records: &mut BlockMap<Record<P>>,
    ) -> PersistenceResult<()> {
        let region = self.storage.region().clone();
        for chunk in region.chunks() {
            for record in records.get_chunk(&chunk) {
                if !record.is_dirty() {
                    continue;
                }
                if let Err(e) = self.write_record(record) {
                    self.dirty = true;
                    return Err(save_error(
                        self.storage.path(),
                        format!("record at {}: {}", record.position(), e),
                    ));
                }
            }
        }

        if let Err(e) = self.storage.save() {
            self.dirty = true;
            return Err(e);
        }
        self.clean(records);
        Ok(())
    }
}
