use crate::constants::{KIND_KEY, PAYLOAD_KEY};
use crate::persistence::{Node, Section};
use crate::world::BlockPos;

/// Reasons a persisted block section cannot become a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("invalid block coordinates in key {key:?}")]
    InvalidCoordinates { key: String },

    #[error("entry {key:?} is not a section")]
    NotASection { key: String },

    #[error("missing key {key:?}")]
    MissingKey { key: &'static str },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("block no longer holds a {kind:?}")]
    RejectedByHost { kind: String },
}

/// Domain data attached to an enchantable block
pub trait RecordPayload: Sized {
    /// Kind of block this payload belongs to, checked against the host on load
    fn kind(&self) -> &str;

    /// Whether the payload carries anything worth persisting
    fn is_valid(&self) -> bool;

    /// Serialized form stored under the block section's payload key
    fn to_node(&self) -> Result<Node, RecordError>;

    fn from_node(node: &Node) -> Result<Self, RecordError>;
}

/// Payload resident at one block position
#[derive(Debug, Clone, PartialEq)]
pub struct Record<P> {
    position: BlockPos,
    payload: P,
    dirty: bool,
}

impl<P: RecordPayload> Record<P> {
    /// A record that has not been written to disk yet
    pub fn new(position: BlockPos, payload: P) -> Self {
        Self {
            position,
            payload,
            dirty: true,
        }
    }

    /// A record matching what is on disk
    pub fn loaded(position: BlockPos, payload: P) -> Self {
        Self {
            position,
            payload,
            dirty: false,
        }
    }

    pub fn position(&self) -> &BlockPos {
        &self.position
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Mutable access to the payload. Marks the record dirty.
    pub fn payload_mut(&mut self) -> &mut P {
        self.dirty = true;
        &mut self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Block section as stored in a region document
    pub fn to_section(&self) -> Result<Section, RecordError> {
        let mut section = Section::new();
        section.insert(KIND_KEY, self.payload.kind());
        section.insert(PAYLOAD_KEY, self.payload.to_node()?);
        Ok(section)
    }

    /// Rebuild a clean record from a block section
    pub fn from_section(position: BlockPos, section: &Section) -> Result<Self, RecordError> {
        let node = section
            .get(PAYLOAD_KEY)
            .ok_or(RecordError::MissingKey { key: PAYLOAD_KEY })?;
        let payload = P::from_node(node)?;

        if let Some(kind) = section.get(KIND_KEY).and_then(Node::as_str) {
            if kind != payload.kind() {
                return Err(RecordError::InvalidPayload(format!(
                    "stored kind {:?} does not match payload kind {:?}",
                    kind,
                    payload.kind()
                )));
            }
        }

        if !payload.is_valid() {
            return Err(RecordError::InvalidPayload("payload is empty".to_string()));
        }

        Ok(Self::loaded(position, payload))
    }
}
