use super::{ConnectorId, Datatype, ShapeId};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// Addresses one magnet: the owning shape, which side, and the position on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MagnetRef {
    pub shape: ShapeId,
    pub direction: Direction,
    pub index: usize,
}

impl MagnetRef {
    pub fn input(shape: ShapeId, index: usize) -> Self {
        Self {
            shape,
            direction: Direction::Input,
            index,
        }
    }

    pub fn output(shape: ShapeId, index: usize) -> Self {
        Self {
            shape,
            direction: Direction::Output,
            index,
        }
    }
}

/// A named connection point on a shape.
///
/// `connected` holds ids into the canvas connector arena, never the connectors
/// themselves. An input magnet holds at most one id.
#[derive(Debug, Clone, PartialEq)]
pub struct Magnet {
    pub label: String,
    pub direction: Direction,
    pub datatype: Datatype,
    /// Offset of the magnet center from the owning shape's center.
    pub offset: Point,
    pub(crate) connected: Vec<ConnectorId>,
}

impl Magnet {
    pub(crate) fn new(label: &str, direction: Direction, datatype: Datatype, offset: Point) -> Self {
        Self {
            label: label.to_string(),
            direction,
            datatype,
            offset,
            connected: Vec::new(),
        }
    }

    pub fn connected(&self) -> &[ConnectorId] {
        &self.connected
    }

    pub fn is_connected(&self) -> bool {
        !self.connected.is_empty()
    }

    pub fn center(&self, shape_position: Point) -> Point {
        shape_position + self.offset
    }
}
