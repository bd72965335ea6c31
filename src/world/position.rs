use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::CHUNK_SHIFT;

/// Position of a chunk column in a named world (chunk coordinates)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub world: String,
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(world: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            z,
        }
    }

    /// Whether a block position falls inside this chunk column
    pub fn contains(&self, pos: &BlockPos) -> bool {
        self.world == pos.world && chunk_of(pos.x) == self.x && chunk_of(pos.z) == self.z
    }

    /// Document key of this chunk inside its region: `"{x}_{z}"`
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.x, self.z)
    }

    /// Parse a chunk storage key back into coordinates. Only the exact form
    /// produced by [`ChunkPos::storage_key`] is accepted.
    pub fn parse_storage_key(world: &str, key: &str) -> Option<Self> {
        let mut parts = key.split('_');
        let x = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        let chunk = Self::new(world, x, z);
        (chunk.storage_key() == key).then_some(chunk)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{}", self.world, self.x, self.z)
    }
}

/// Position of a single block in a named world (block coordinates)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Get the chunk column this block belongs to
    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::new(self.world.clone(), chunk_of(self.x), chunk_of(self.z))
    }

    /// Document key of this block inside its chunk section: `"{x}_{y}_{z}"`
    pub fn storage_key(&self) -> String {
        format!("{}_{}_{}", self.x, self.y, self.z)
    }

    /// Parse a block storage key back into coordinates.
    ///
    /// Returns `None` unless the key is exactly three `_`-separated decimal
    /// integers in the exact form [`BlockPos::storage_key`] writes, so
    /// `"01_64_1"` and `"+1_64_1"` are rejected.
    pub fn parse_storage_key(world: &str, key: &str) -> Option<Self> {
        let mut parts = key.split('_');
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        let pos = Self::new(world, x, y, z);
        (pos.storage_key() == key).then_some(pos)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{},{}", self.world, self.x, self.y, self.z)
    }
}

/// Chunk coordinate containing a block coordinate (floor division by 16)
#[inline]
pub const fn chunk_of(block: i32) -> i32 {
    block >> CHUNK_SHIFT
}

/// Lowest block coordinate of a chunk coordinate
#[inline]
pub const fn chunk_to_block(chunk: i32) -> i32 {
    chunk << CHUNK_SHIFT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CHUNK_SIZE;

    #[test]
    fn test_chunk_of_floors_negative_coordinates() {
        assert_eq!(chunk_of(0), 0);
        assert_eq!(chunk_of(15), 0);
        assert_eq!(chunk_of(16), 1);
        assert_eq!(chunk_of(-1), -1);
        assert_eq!(chunk_of(-16), -1);
        assert_eq!(chunk_of(-17), -2);
    }

    #[test]
    fn test_chunk_bounds_contain_block() {
        for x in [-1025, -513, -17, -16, -1, 0, 1, 15, 16, 511, 512, i32::MIN, i32::MAX] {
            let min = chunk_to_block(chunk_of(x)) as i64;
            assert!(min <= x as i64 && (x as i64) < min + CHUNK_SIZE as i64, "x = {}", x);
        }
    }

    #[test]
    fn test_block_chunk_and_local_pos() {
        let pos = BlockPos::new("w", -1, 64, -1);
        assert_eq!(pos.chunk(), ChunkPos::new("w", -1, -1));
        assert!(pos.chunk().contains(&pos));
        assert!(!ChunkPos::new("other", -1, -1).contains(&pos));
    }

    #[test]
    fn test_storage_keys() {
        let pos = BlockPos::new("w", -1, 64, -1);
        assert_eq!(pos.storage_key(), "-1_64_-1");
        assert_eq!(pos.chunk().storage_key(), "-1_-1");

        assert_eq!(BlockPos::parse_storage_key("w", "-1_64_-1"), Some(pos));
        assert_eq!(BlockPos::parse_storage_key("w", "a_64_-1"), None);
        assert_eq!(BlockPos::parse_storage_key("w", "1_2"), None);
        assert_eq!(BlockPos::parse_storage_key("w", "1_2_3_4"), None);
    }

    #[test]
    fn test_non_canonical_keys_rejected() {
        for key in ["01_64_1", "+1_64_1", "1_064_1", "1_64_-01", "-0_64_1", "1_64_1 ", "1__64_1"] {
            assert_eq!(BlockPos::parse_storage_key("w", key), None, "key = {:?}", key);
        }
        assert_eq!(
            BlockPos::parse_storage_key("w", "0_-64_2147483647"),
            Some(BlockPos::new("w", 0, -64, i32::MAX))
        );

        assert_eq!(
            ChunkPos::parse_storage_key("w", "-1_-1"),
            Some(ChunkPos::new("w", -1, -1))
        );
        for key in ["00_0", "+0_0", "0_0_0", "0", "a_0"] {
            assert_eq!(ChunkPos::parse_storage_key("w", key), None, "key = {:?}", key);
        }
    }
}
