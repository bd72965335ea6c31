//! Per-block records and their payloads

pub mod item;
pub mod record;

pub use item::{EnchantedItem, MAX_STACK_SIZE};
pub use record::{Record, RecordError, RecordPayload};
