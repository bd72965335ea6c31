// Enchantable block storage constants
//
// Spatial granularity and cache timing shared by the index, the region
// documents and the manager. Keep every size definition here.

/// World grid constants
pub mod grid {
    /// Blocks along one horizontal edge of a chunk
    pub const CHUNK_SIZE: i32 = 16;
    /// log2(CHUNK_SIZE), used for floor division by shifting
    pub const CHUNK_SHIFT: u32 = 4;

    /// Chunks along one edge of a region
    pub const REGION_CHUNKS: i32 = 32;
    /// log2(REGION_CHUNKS)
    pub const REGION_CHUNK_SHIFT: u32 = 5;

    /// Blocks along one edge of a region (32 × 16)
    pub const REGION_SIZE: i32 = CHUNK_SIZE * REGION_CHUNKS;
    /// log2(REGION_SIZE)
    pub const REGION_SHIFT: u32 = CHUNK_SHIFT + REGION_CHUNK_SHIFT;
}

/// Region document constants
pub mod storage {
    /// Extension of region document files
    pub const REGION_FILE_EXTENSION: &str = "json";
    /// Default data directory, relative to the working directory
    pub const DEFAULT_DATA_DIR: &str = "data";

    /// Key holding the serialized payload inside a block section
    pub const PAYLOAD_KEY: &str = "payload";
    /// Key holding the payload kind inside a block section
    pub const KIND_KEY: &str = "kind";
}

/// Cache timing constants
pub mod cache {
    use std::time::Duration;

    /// Shortest retention a cache accepts
    pub const MIN_RETENTION: Duration = Duration::from_secs(60);
    /// Retention used when no configuration is supplied (5 minutes)
    pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);
}

pub use cache::*;
pub use grid::*;
pub use storage::*;
