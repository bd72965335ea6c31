//! Region coordinate math
//!
//! A region groups 32×32 chunks (512×512 blocks) and is the unit at which
//! records are written to disk. All conversions floor toward negative
//! infinity, so block -1 lives in chunk -1 and region -1.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{REGION_CHUNKS, REGION_CHUNK_SHIFT, REGION_SHIFT};
use crate::world::position::{BlockPos, ChunkPos};

/// Identifier of one region in a named world
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region {
    pub world: String,
    pub x: i32,
    pub z: i32,
}

impl Region {
    pub fn new(world: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            z,
        }
    }

    /// Region containing a block
    pub fn of_block(pos: &BlockPos) -> Self {
        Self::new(pos.world.clone(), region_of(pos.x), region_of(pos.z))
    }

    /// Region containing a chunk
    pub fn of_chunk(chunk: &ChunkPos) -> Self {
        Self::new(
            chunk.world.clone(),
            chunk_to_region(chunk.x),
            chunk_to_region(chunk.z),
        )
    }

    /// Lowest chunk X covered by this region
    pub fn min_chunk_x(&self) -> i32 {
        region_to_chunk(self.x)
    }

    /// Lowest chunk Z covered by this region
    pub fn min_chunk_z(&self) -> i32 {
        region_to_chunk(self.z)
    }

    /// Whether a chunk lies inside this region
    pub fn contains_chunk(&self, chunk: &ChunkPos) -> bool {
        self.world == chunk.world
            && chunk_to_region(chunk.x) == self.x
            && chunk_to_region(chunk.z) == self.z
    }

    /// Iterate every chunk covered by this region, X-major
    pub fn chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        let min_x = self.min_chunk_x();
        let min_z = self.min_chunk_z();
        (min_x..min_x + REGION_CHUNKS).flat_map(move |x| {
            (min_z..min_z + REGION_CHUNKS).map(move |z| ChunkPos::new(self.world.clone(), x, z))
        })
    }

    /// Check chunks until one matches. Short-circuits on the first `true`.
    pub fn any_chunk_match<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&ChunkPos) -> bool,
    {
        self.chunks().any(|chunk| predicate(&chunk))
    }

    /// Run a function for each chunk of the region
    pub fn for_each_chunk<F>(&self, mut f: F)
    where
        F: FnMut(&ChunkPos),
    {
        for chunk in self.chunks() {
            f(&chunk);
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:r.{}.{}", self.world, self.x, self.z)
    }
}

/// Region coordinate containing a block coordinate (floor division by 512)
#[inline]
pub const fn region_of(block: i32) -> i32 {
    block >> REGION_SHIFT
}

/// Region coordinate containing a chunk coordinate (floor division by 32)
#[inline]
pub const fn chunk_to_region(chunk: i32) -> i32 {
    chunk >> REGION_CHUNK_SHIFT
}

/// Lowest chunk coordinate of a region coordinate
#[inline]
pub const fn region_to_chunk(region: i32) -> i32 {
    region << REGION_CHUNK_SHIFT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REGION_SIZE;
    use crate::world::position::{chunk_of, chunk_to_block};

    const SAMPLES: [i32; 14] = [
        i32::MIN, -1_000_000, -1025, -513, -512, -511, -1, 0, 1, 511, 512, 513, 1_000_000, i32::MAX,
    ];

    #[test]
    fn test_region_of_floors() {
        assert_eq!(region_of(-1), -1);
        assert_eq!(region_of(-512), -1);
        assert_eq!(region_of(-513), -2);
        assert_eq!(region_of(0), 0);
        assert_eq!(region_of(511), 0);
        assert_eq!(region_of(512), 1);
    }

    #[test]
    fn test_region_of_chunk_matches_region_of_block() {
        for x in SAMPLES {
            assert_eq!(chunk_to_region(chunk_of(x)), region_of(x), "x = {}", x);
        }
    }

    #[test]
    fn test_region_bounds_contain_block() {
        for x in SAMPLES {
            let min = chunk_to_block(region_to_chunk(region_of(x))) as i64;
            let x = x as i64;
            assert!(min <= x && x < min + REGION_SIZE as i64, "x = {}", x);
        }
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        for x in SAMPLES {
            let once = region_to_chunk(region_of(chunk_to_block(chunk_of(x))));
            let twice = region_to_chunk(region_of(chunk_to_block(once)));
            assert_eq!(once, twice, "x = {}", x);
        }
    }

    #[test]
    fn test_chunks_cover_region() {
        let region = Region::new("w", -1, 2);
        let chunks: Vec<_> = region.chunks().collect();
        assert_eq!(chunks.len(), (REGION_CHUNKS * REGION_CHUNKS) as usize);
        assert_eq!(chunks[0], ChunkPos::new("w", -32, 64));
        assert!(chunks.iter().all(|chunk| region.contains_chunk(chunk)));
        assert!(chunks.iter().all(|chunk| Region::of_chunk(chunk) == region));
    }

    #[test]
    fn test_any_chunk_match_short_circuits() {
        let region = Region::new("w", 0, 0);
        let mut visited = 0;
        let found = region.any_chunk_match(|chunk| {
            visited += 1;
            chunk.x == 0 && chunk.z == 3
        });
        assert!(found);
        assert_eq!(visited, 4);

        assert!(!region.any_chunk_match(|chunk| chunk.x >= REGION_CHUNKS));
    }

    #[test]
    fn test_for_each_chunk_visits_all() {
        let region = Region::new("w", 3, -3);
        let mut count = 0;
        region.for_each_chunk(|chunk| {
            assert!(region.contains_chunk(chunk));
            count += 1;
        });
        assert_eq!(count, 1024);
    }

    #[test]
    fn test_of_block_negative() {
        let region = Region::of_block(&BlockPos::new("w", -1, 64, -1));
        assert_eq!(region, Region::new("w", -1, -1));
    }
}
