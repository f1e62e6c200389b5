use super::{MagnetRef, ShapeId};
use slotmap::KeyData;
use std::fmt;

slotmap::new_key_type! {
    /// Stable handle into the canvas connector arena.
    pub struct ConnectorId;
}

impl From<u64> for ConnectorId {
    fn from(value: u64) -> Self {
        Self(KeyData::from_ffi(value))
    }
}

impl ConnectorId {
    pub fn as_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cable#{:?}", self.0)
    }
}

/// A directed cable from an output magnet to an input magnet.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub id: ConnectorId,
    pub source: MagnetRef,
    pub dest: MagnetRef,
    /// Set when the endpoint datatypes disagree. The cable stays on the canvas
    /// but the pipeline cannot be submitted.
    pub type_mismatch: bool,
}

impl Connector {
    pub fn touches(&self, shape: ShapeId) -> bool {
        self.source.shape == shape || self.dest.shape == shape
    }
}
