//! Sparse coordinate-keyed container for per-block values
//!
//! Values are stored in one flat map keyed by block position. A secondary
//! index groups positions by chunk column for range operations, and a
//! per-world counter answers "does this world hold anything" without a scan.
//! Both indexes are updated in lockstep with the primary map and pruned as
//! soon as they empty.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::world::position::{BlockPos, ChunkPos};

/// Block position → value map with chunk-granular range access
#[derive(Debug)]
pub struct BlockMap<V> {
    values: FxHashMap<BlockPos, V>,
    chunks: FxHashMap<ChunkPos, FxHashSet<BlockPos>>,
    worlds: FxHashMap<String, usize>,
}

impl<V> Default for BlockMap<V> {
    fn default() -> Self {
        Self {
            values: FxHashMap::default(),
            chunks: FxHashMap::default(),
            worlds: FxHashMap::default(),
        }
    }
}

impl<V> BlockMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value at a position, returning the previous one
    pub fn put(&mut self, pos: BlockPos, value: V) -> Option<V> {
        if let Some(existing) = self.values.get_mut(&pos) {
            return Some(std::mem::replace(existing, value));
        }

        self.chunks.entry(pos.chunk()).or_default().insert(pos.clone());
        *self.worlds.entry(pos.world.clone()).or_insert(0) += 1;
        self.values.insert(pos, value);
        None
    }

    pub fn get(&self, pos: &BlockPos) -> Option<&V> {
        self.values.get(pos)
    }

    pub fn get_mut(&mut self, pos: &BlockPos) -> Option<&mut V> {
        self.values.get_mut(pos)
    }

    pub fn contains(&self, pos: &BlockPos) -> bool {
        self.values.contains_key(pos)
    }

    /// Remove the value at a position, pruning emptied indexes
    pub fn remove(&mut self, pos: &BlockPos) -> Option<V> {
        let value = self.values.remove(pos)?;

        let chunk = pos.chunk();
        if let Some(members) = self.chunks.get_mut(&chunk) {
            members.remove(pos);
            if members.is_empty() {
                self.chunks.remove(&chunk);
            }
        }
        self.release_world(&pos.world, 1);

        Some(value)
    }

    /// All values inside a chunk column, across every Y
    pub fn get_chunk(&self, chunk: &ChunkPos) -> Vec<&V> {
        match self.chunks.get(chunk) {
            Some(members) => members.iter().filter_map(|pos| self.values.get(pos)).collect(),
            None => Vec::new(),
        }
    }

    /// Visit every value inside a chunk column mutably
    pub fn for_each_in_chunk_mut<F>(&mut self, chunk: &ChunkPos, mut f: F)
    where
        F: FnMut(&mut V),
    {
        let Some(members) = self.chunks.get(chunk) else {
            return;
        };
        for pos in members {
            if let Some(value) = self.values.get_mut(pos) {
                f(value);
            }
        }
    }

    /// Whether any value is held inside a chunk column
    pub fn has_chunk(&self, chunk: &ChunkPos) -> bool {
        self.chunks.contains_key(chunk)
    }

    /// Remove and return every value inside a chunk column
    pub fn remove_chunk(&mut self, chunk: &ChunkPos) -> Vec<V> {
        let Some(members) = self.chunks.remove(chunk) else {
            return Vec::new();
        };

        let removed: Vec<V> = members
            .iter()
            .filter_map(|pos| self.values.remove(pos))
            .collect();
        self.release_world(&chunk.world, removed.len());
        removed
    }

    /// Whether any value is held for a world
    pub fn has_world(&self, world: &str) -> bool {
        self.worlds.contains_key(world)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BlockPos, &V)> {
        self.values.iter()
    }

    fn release_world(&mut self, world: &str, count: usize) {
        if count == 0 {
            return;
        }
        if let Some(remaining) = self.worlds.get_mut(world) {
            *remaining = remaining.saturating_sub(count);
            if *remaining == 0 {
                self.worlds.remove(world);
            }
        }
    }
}
