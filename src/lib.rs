pub mod block;
pub mod cache;
pub mod config;
pub mod constants;
pub mod manager;
pub mod persistence;
pub mod world;

pub use block::{EnchantedItem, Record, RecordError, RecordPayload};
pub use cache::{Cache, CacheError, CachePolicy, Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ManagerConfig};
pub use manager::{ChunkHost, EnchantableBlockManager, LoadedChunks, RegionStorageEntry};
pub use persistence::{Node, PersistenceError, PersistenceResult, RegionStorage, Section};
pub use world::{BlockMap, BlockPos, ChunkPos, Region};
