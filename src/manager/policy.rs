//! Region cache policy
//!
//! Load: read the region's document, or start an empty one when asked to
//! create. In use: any of the region's chunks is loaded by the host. Dirty
//! regions are flushed during the in-use check, and a region whose flush
//! fails is kept resident so a later sweep retries. Removal: drop the
//! region's records from the spatial index.
//!
//! Top-level sections that are not canonical chunk keys of the region are
//! pruned as the document is loaded.

use std::path::Path;

use crate::block::{Record, RecordPayload};
use crate::cache::CachePolicy;
use crate::manager::entry::RegionStorageEntry;
use crate::manager::host::ChunkHost;
use crate::persistence::RegionStorage;
use crate::world::{BlockMap, Region};

/// Policy borrowing the manager's state for the duration of one cache call
pub(crate) struct RegionPolicy<'a, P, H> {
    pub data_dir: &'a Path,
    pub records: &'a mut BlockMap<Record<P>>,
    pub host: &'a H,
}

impl<'a, P, H> RegionPolicy<'a, P, H> {
    pub fn new(data_dir: &'a Path, records: &'a mut BlockMap<Record<P>>, host: &'a H) -> Self {
        Self {
            data_dir,
            records,
            host,
        }
    }
}

/// Build a cache entry for a region. Without `create`, a region that has
/// never been written produces nothing.
pub(crate) fn load_region(data_dir: &Path, region: &Region, create: bool) -> Option<RegionStorageEntry> {
    let mut storage = RegionStorage::new(data_dir, region.clone());
    if !create && !storage.exists() {
        return None;
    }

    if let Err(e) = storage.load() {
        log::error!("[load_region] Failed to load region {}: {}", region, e);
    }

    let mut entry = RegionStorageEntry::new(storage);
    for key in entry.prune_foreign_chunks() {
        log::warn!(
            "[load_region] Dropping section {:?} in {}: not a chunk of this region",
            key,
            region
        );
    }
    log::debug!("[load_region] Region {} resident", region);
    Some(entry)
}

/// Flush a dirty entry, logging failures. Returns whether the entry is clean.
pub(crate) fn flush_if_dirty<P: RecordPayload>(
    region: &Region,
    entry: &mut RegionStorageEntry,
    records: &mut BlockMap<Record<P>>,
) -> bool {
    if !entry.is_dirty(records) {
        return true;
    }

    match entry.flush(records) {
        Ok(()) => {
            log::debug!("[flush_if_dirty] Saved region {}", region);
            true
        }
        Err(e) => {
            log::error!("[flush_if_dirty] Failed to save region {}: {}", region, e);
            false
        }
    }
}

impl<'a, P, H> CachePolicy<Region, RegionStorageEntry> for RegionPolicy<'a, P, H>
where
    P: RecordPayload,
    H: ChunkHost,
{
    fn load(&mut self, region: &Region, create: bool) -> Option<RegionStorageEntry> {
        load_region(self.data_dir, region, create)
    }

    fn in_use(&mut self, region: &Region, entry: &mut RegionStorageEntry) -> bool {
        if !flush_if_dirty(region, entry, self.records) {
            return true;
        }
        region.any_chunk_match(|chunk| self.host.is_chunk_loaded(chunk))
    }

    fn on_removal(&mut self, region: Region, mut entry: RegionStorageEntry) {
        if !flush_if_dirty(&region, &mut entry, self.records) {
            log::warn!("[on_removal] Region {} evicted with unsaved changes", region);
        }

        let mut dropped = 0;
        region.for_each_chunk(|chunk| dropped += self.records.remove_chunk(chunk).len());
        log::debug!(
            "[on_removal] Evicted region {} ({} resident records dropped)",
            region,
            dropped
        );
    }
}
