//! World addressing: positions, regions and the sparse block index

pub mod block_map;
pub mod position;
pub mod region;

pub use block_map::BlockMap;
pub use position::{chunk_of, chunk_to_block, BlockPos, ChunkPos};
pub use region::{chunk_to_region, region_of, region_to_chunk, Region};
