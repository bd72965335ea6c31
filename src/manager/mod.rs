//! Enchantable block manager
//!
//! Owns the spatial index of resident records and the region cache, and keeps
//! the two in step. Records are read from disk one chunk at a time as the
//! host loads chunks. Writes happen when the region cache sweeps, never on
//! behalf of a single record.

mod entry;
mod host;
mod policy;

pub use entry::RegionStorageEntry;
pub use host::{ChunkHost, LoadedChunks};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::block::{Record, RecordError, RecordPayload};
use crate::cache::{Cache, CacheError, Clock, SystemClock};
use crate::config::ManagerConfig;
use crate::persistence::Node;
use crate::world::{BlockMap, BlockPos, ChunkPos, Region};
use policy::RegionPolicy;

/// Persists per-block payloads in region documents
pub struct EnchantableBlockManager<P, H> {
    data_dir: PathBuf,
    records: BlockMap<Record<P>>,
    regions: Cache<Region, RegionStorageEntry>,
    host: H,
}

impl<P, H> EnchantableBlockManager<P, H>
where
    P: RecordPayload,
    H: ChunkHost,
{
    /// Create a manager reading the system clock
    pub fn new(config: &ManagerConfig, host: H) -> Result<Self, CacheError> {
        Self::with_clock(config, host, Arc::new(SystemClock))
    }

    /// Create a manager whose region cache reads the given clock
    pub fn with_clock(
        config: &ManagerConfig,
        host: H,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CacheError> {
        let regions = Cache::with_clock(config.retention()?, clock)?;
        log::info!(
            "[EnchantableBlockManager] Storing regions under {} (retention {:?})",
            config.data_dir.display(),
            regions.retention()
        );

        Ok(Self {
            data_dir: config.data_dir.clone(),
            records: BlockMap::new(),
            regions,
            host,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Create a record for a payload at a position.
    ///
    /// Returns `None` without touching disk if the payload is invalid or
    /// cannot be serialized, or if a record already exists there.
    pub fn create(&mut self, position: BlockPos, payload: P) -> Option<&mut Record<P>> {
        if !payload.is_valid() || self.records.contains(&position) {
            return None;
        }

        let record = Record::new(position.clone(), payload);
        if let Err(e) = record.to_section() {
            log::warn!(
                "[EnchantableBlockManager::create] Rejecting payload at {}: {}",
                position,
                e
            );
            return None;
        }

        let region = Region::of_block(&position);
        let Self {
            data_dir,
            records,
            regions,
            host,
        } = self;
        let entry = regions.get(&region, true, &mut RegionPolicy::new(data_dir, records, host))?;

        if let Err(e) = entry.write_record(&record) {
            log::error!(
                "[EnchantableBlockManager::create] Failed to store record at {}: {}",
                position,
                e
            );
            return None;
        }
        entry.mark_dirty();

        records.put(position.clone(), record);
        records.get_mut(&position)
    }

    /// Remove the record at a position, returning its payload.
    ///
    /// The block section is also dropped from the region document if the
    /// region has one.
    pub fn destroy(&mut self, position: &BlockPos) -> Option<P> {
        let removed = self.records.remove(position);

        let region = Region::of_block(position);
        let Self {
            data_dir,
            records,
            regions,
            host,
        } = self;
        if let Some(entry) = regions.get(&region, false, &mut RegionPolicy::new(data_dir, records, host)) {
            if entry.remove_record(position) || removed.is_some() {
                entry.mark_dirty();
            }
        }

        removed.map(Record::into_payload)
    }

    /// Resident record at a position. Never touches disk.
    pub fn get(&self, position: &BlockPos) -> Option<&Record<P>> {
        self.records.get(position)
    }

    /// Mutable resident record at a position. Use [`Record::payload_mut`] so
    /// changes are flushed.
    pub fn get_mut(&mut self, position: &BlockPos) -> Option<&mut Record<P>> {
        self.records.get_mut(position)
    }

    /// Resident records inside a chunk
    pub fn records_in_chunk(&self, chunk: &ChunkPos) -> Vec<&Record<P>> {
        self.records.get_chunk(chunk)
    }

    /// Read a chunk's records from its region document into the index.
    ///
    /// Entries that cannot be rebuilt are logged and removed from the
    /// document, which is then marked dirty. Records already resident are
    /// left untouched.
    pub fn load_chunk(&mut self, chunk: &ChunkPos) {
        let region = Region::of_chunk(chunk);
        let Self {
            data_dir,
            records,
            regions,
            host,
        } = self;
        let Some(entry) = regions.get(&region, false, &mut RegionPolicy::new(data_dir, records, host))
        else {
            return;
        };

        let chunk_key = chunk.storage_key();
        let Some(node) = entry.storage().root().get(&chunk_key) else {
            return;
        };
        let Some(section) = node.as_section() else {
            log::warn!(
                "[EnchantableBlockManager::load_chunk] Dropping chunk entry {} in {}: not a section ({})",
                chunk_key,
                region,
                node.to_json()
            );
            entry.storage_mut().root_mut().remove(&chunk_key);
            entry.mark_dirty();
            return;
        };

        let mut rejected = Vec::new();
        let mut loaded = 0;
        for (block_key, node) in section.iter() {
            match parse_record::<P, H>(chunk, block_key, node, host) {
                Ok(record) => {
                    if !records.contains(record.position()) {
                        records.put(record.position().clone(), record);
                        loaded += 1;
                    }
                }
                Err(e) => {
                    log::warn!(
                        "[EnchantableBlockManager::load_chunk] Dropping {}.{} in {}: {} ({})",
                        chunk_key,
                        block_key,
                        region,
                        e,
                        node.to_json()
                    );
                    rejected.push(block_key.to_string());
                }
            }
        }

        if !rejected.is_empty() {
            let root = entry.storage_mut().root_mut();
            for block_key in &rejected {
                root.remove_path(&[chunk_key.as_str(), block_key.as_str()]);
            }
            entry.mark_dirty();
        }

        log::debug!(
            "[EnchantableBlockManager::load_chunk] Chunk {}: {} loaded, {} dropped",
            chunk,
            loaded,
            rejected.len()
        );
    }

    /// Drop a chunk's records from the index.
    ///
    /// Dirty records are first written into the resident region document;
    /// the region cache decides when that reaches disk.
    pub fn unload_chunk(&mut self, chunk: &ChunkPos) {
        let has_dirty = self
            .records
            .get_chunk(chunk)
            .iter()
            .any(|record| record.is_dirty());

        if has_dirty {
            let region = Region::of_chunk(chunk);
            let Self {
                data_dir,
                records,
                regions,
                host,
            } = self;
            if let Some(entry) = regions.get(&region, true, &mut RegionPolicy::new(data_dir, records, host)) {
                let mut written = false;
                for record in records.get_chunk(chunk) {
                    if !record.is_dirty() {
                        continue;
                    }
                    match entry.write_record(record) {
                        Ok(()) => written = true,
                        Err(e) => log::error!(
                            "[EnchantableBlockManager::unload_chunk] Losing unsaved record at {}: {}",
                            record.position(),
                            e
                        ),
                    }
                }
                if written {
                    entry.mark_dirty();
                }
            }
        }

        self.records.remove_chunk(chunk);
    }

    /// Force every resident region through the in-use check, flushing all
    /// dirty regions and evicting those no longer in use
    pub fn expire_cache(&mut self) {
        log::info!(
            "[EnchantableBlockManager::expire_cache] Expiring {} resident regions",
            self.regions.len()
        );
        let Self {
            data_dir,
            records,
            regions,
            host,
        } = self;
        regions.expire_all(&mut RegionPolicy::new(data_dir, records, host));
    }

    /// Whether a region's document is resident, after sweeping expired regions
    pub fn is_region_resident(&mut self, region: &Region) -> bool {
        let Self {
            data_dir,
            records,
            regions,
            host,
        } = self;
        regions.contains_key(region, &mut RegionPolicy::new(data_dir, records, host))
    }

    /// Resident region document, without sweeping or re-arming its expiry
    pub fn region_entry(&self, region: &Region) -> Option<&RegionStorageEntry> {
        self.regions.peek(region)
    }

    /// Number of resident regions
    pub fn cache_len(&self) -> usize {
        self.regions.len()
    }

    /// Number of resident records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Rebuild one block entry of a chunk section
fn parse_record<P, H>(
    chunk: &ChunkPos,
    block_key: &str,
    node: &Node,
    host: &H,
) -> Result<Record<P>, RecordError>
where
    P: RecordPayload,
    H: ChunkHost,
{
    let position = BlockPos::parse_storage_key(&chunk.world, block_key)
        .filter(|position| chunk.contains(position))
        .ok_or_else(|| RecordError::InvalidCoordinates {
            key: block_key.to_string(),
        })?;

    let section = node.as_section().ok_or_else(|| RecordError::NotASection {
        key: block_key.to_string(),
    })?;

    let record = Record::<P>::from_section(position, section)?;
    if !host.accepts(record.position(), record.payload().kind()) {
        return Err(RecordError::RejectedByHost {
            kind: record.payload().kind().to_string(),
        });
    }
    Ok(record)
}

impl<P, H> std::fmt::Debug for EnchantableBlockManager<P, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnchantableBlockManager")
            .field("data_dir", &self.data_dir)
            .field("records", &self.records.len())
            .field("regions", &self.regions)
            .finish()
    }
}
