use super::{Datatype, Direction, Magnet, MagnetRef};
use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use slotmap::KeyData;
use std::fmt;

pub const DATA_NODE_SIZE: f64 = 48.0;
pub const STEP_WIDTH: f64 = 112.0;
/// Vertical space reserved for each magnet along a step's edge.
pub const MAGNET_SPACING: f64 = 20.0;
const STEP_PADDING: f64 = 24.0;

slotmap::new_key_type! {
    /// Stable handle for a shape on one canvas.
    pub struct ShapeId;
}

impl From<u64> for ShapeId {
    fn from(value: u64) -> Self {
        Self(KeyData::from_ffi(value))
    }
}

impl ShapeId {
    pub fn as_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{:?}", self.0)
    }
}

/// A declared input or output of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPort {
    pub name: String,
    pub datatype: Datatype,
}

impl StepPort {
    pub fn new(name: &str, datatype: Datatype) -> Self {
        Self {
            name: name.to_string(),
            datatype,
        }
    }

    pub fn any(name: &str) -> Self {
        Self::new(name, Datatype::Any)
    }
}

/// The kind-specific payload of a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A pipeline input accepting untyped data.
    RawData { name: String },
    /// A pipeline input bound to a compound datatype.
    TypedData { name: String, cdt: u64 },
    /// One method invocation.
    Step {
        name: String,
        transformation_pk: u64,
        family_pk: u64,
        inputs: Vec<StepPort>,
        outputs: Vec<StepPort>,
    },
    /// A pipeline output.
    Output { name: String, output_id: Option<u64> },
}

impl NodeKind {
    pub fn name(&self) -> &str {
        match self {
            NodeKind::RawData { name }
            | NodeKind::TypedData { name, .. }
            | NodeKind::Step { name, .. }
            | NodeKind::Output { name, .. } => name,
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, NodeKind::Step { .. })
    }

    pub fn is_pipeline_input(&self) -> bool {
        matches!(self, NodeKind::RawData { .. } | NodeKind::TypedData { .. })
    }

    pub fn is_output(&self) -> bool {
        matches!(self, NodeKind::Output { .. })
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            NodeKind::RawData { .. } => "raw input",
            NodeKind::TypedData { .. } => "typed input",
            NodeKind::Step { .. } => "step",
            NodeKind::Output { .. } => "output",
        }
    }

    /// Width and height of the shape body.
    pub fn size(&self) -> (f64, f64) {
        match self {
            NodeKind::Step {
                inputs, outputs, ..
            } => {
                let slots = inputs.len().max(outputs.len()).max(1) as f64;
                (STEP_WIDTH, STEP_PADDING + slots * MAGNET_SPACING)
            }
            _ => (DATA_NODE_SIZE, DATA_NODE_SIZE),
        }
    }

    fn build_magnets(&self) -> (Vec<Magnet>, Vec<Magnet>) {
        let (width, _) = self.size();
        let left = -width / 2.0;
        let right = width / 2.0;
        match self {
            NodeKind::RawData { name } => (
                Vec::new(),
                vec![Magnet::new(
                    name,
                    Direction::Output,
                    Datatype::Any,
                    Point::new(right, 0.0),
                )],
            ),
            NodeKind::TypedData { name, cdt } => (
                Vec::new(),
                vec![Magnet::new(
                    name,
                    Direction::Output,
                    Datatype::Compound(*cdt),
                    Point::new(right, 0.0),
                )],
            ),
            NodeKind::Output { name, .. } => (
                vec![Magnet::new(
                    name,
                    Direction::Input,
                    Datatype::Any,
                    Point::new(left, 0.0),
                )],
                Vec::new(),
            ),
            NodeKind::Step {
                inputs, outputs, ..
            } => (
                layout_ports(inputs, Direction::Input, left),
                layout_ports(outputs, Direction::Output, right),
            ),
        }
    }
}

/// Spreads magnets evenly along one vertical edge, centered on the shape.
fn layout_ports(ports: &[StepPort], direction: Direction, x: f64) -> Vec<Magnet> {
    let start = -(ports.len() as f64) * MAGNET_SPACING / 2.0 + MAGNET_SPACING / 2.0;
    ports
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let y = start + i as f64 * MAGNET_SPACING;
            Magnet::new(&port.name, direction, port.datatype, Point::new(x, y))
        })
        .collect()
}

/// A positioned node on the canvas.
///
/// The kind and the magnet layout are fixed at construction. Only the position
/// and the magnets' connection lists change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    id: ShapeId,
    kind: NodeKind,
    pub position: Point,
    inputs: Vec<Magnet>,
    outputs: Vec<Magnet>,
}

impl Shape {
    pub(crate) fn new(id: ShapeId, kind: NodeKind, position: Point) -> Self {
        let (inputs, outputs) = kind.build_magnets();
        Self {
            id,
            kind,
            position,
            inputs,
            outputs,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn inputs(&self) -> &[Magnet] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Magnet] {
        &self.outputs
    }

    pub fn magnets(&self, direction: Direction) -> &[Magnet] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    pub fn magnet(&self, direction: Direction, index: usize) -> Option<&Magnet> {
        self.magnets(direction).get(index)
    }

    pub(crate) fn magnet_mut(&mut self, direction: Direction, index: usize) -> Option<&mut Magnet> {
        match direction {
            Direction::Input => self.inputs.get_mut(index),
            Direction::Output => self.outputs.get_mut(index),
        }
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|m| m.label == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|m| m.label == name)
    }

    pub fn bounding_box(&self) -> Rect {
        let (w, h) = self.kind.size();
        Rect::centered(self.position, w, h)
    }

    /// The bounding box this shape would have if centered on `position`.
    pub fn bounding_box_at(&self, position: Point) -> Rect {
        let (w, h) = self.kind.size();
        Rect::centered(position, w, h)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.bounding_box().contains(p)
    }

    pub fn magnet_center(&self, direction: Direction, index: usize) -> Option<Point> {
        self.magnet(direction, index)
            .map(|m| m.center(self.position))
    }

    /// Finds the magnet whose center lies within `radius` of `p`, nearest first.
    pub fn magnet_at(&self, p: Point, radius: f64) -> Option<MagnetRef> {
        let radius_sq = radius * radius;
        self.all_magnets()
            .map(|(r, m)| (r, m.center(self.position).distance_squared(p)))
            .filter(|(_, d)| *d <= radius_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(r, _)| r)
    }

    /// Iterates every magnet with its reference.
    pub fn all_magnets(&self) -> impl Iterator<Item = (MagnetRef, &Magnet)> {
        let id = self.id;
        self.inputs
            .iter()
            .enumerate()
            .map(move |(i, m)| (MagnetRef::input(id, i), m))
            .chain(
                self.outputs
                    .iter()
                    .enumerate()
                    .map(move |(i, m)| (MagnetRef::output(id, i), m)),
            )
    }
}
