use rustc_hash::FxHashSet;

use crate::world::{BlockPos, ChunkPos};

/// What the manager needs to know about the world hosting it
pub trait ChunkHost {
    /// Whether the host currently has a chunk loaded
    fn is_chunk_loaded(&self, chunk: &ChunkPos) -> bool;

    /// Whether the block at a position can still hold a payload of `kind`.
    /// Records failing this check are dropped on load.
    fn accepts(&self, _position: &BlockPos, _kind: &str) -> bool {
        true
    }
}

/// Host backed by an explicit set of loaded chunks
#[derive(Debug, Clone, Default)]
pub struct LoadedChunks {
    chunks: FxHashSet<ChunkPos>,
}

impl LoadedChunks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk as loaded. Returns false if it already was.
    pub fn load(&mut self, chunk: ChunkPos) -> bool {
        self.chunks.insert(chunk)
    }

    /// Record a chunk as unloaded. Returns false if it was not loaded.
    pub fn unload(&mut self, chunk: &ChunkPos) -> bool {
        self.chunks.remove(chunk)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl ChunkHost for LoadedChunks {
    fn is_chunk_loaded(&self, chunk: &ChunkPos) -> bool {
        self.chunks.contains(chunk)
    }
}
