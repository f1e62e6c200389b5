use crate::model::{ConnectorId, Datatype, Direction, MagnetRef, ShapeId};
use thiserror::Error;

/// Contract violations by the code driving the canvas. These point at a wiring
/// bug in the host, not at anything the user did.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("Shape '{0}' does not exist on this canvas")]
    UnknownShape(ShapeId),

    #[error("Connector '{0}' does not exist on this canvas")]
    UnknownConnector(ConnectorId),

    #[error("Magnet {index} ({direction:?}) does not exist on shape '{shape}'")]
    UnknownMagnet {
        shape: ShapeId,
        direction: Direction,
        index: usize,
    },

    #[error("Canvas dimensions must be positive and finite, got {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("Invalid canvas configuration: {0}")]
    InvalidConfig(String),
}

/// Why a drag-to-connect gesture produced no cable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectRejection {
    #[error("A cable cannot start and end on the same shape")]
    SameShape,

    #[error("Cables must join an output magnet to an input magnet")]
    SameDirection,

    #[error("These two magnets are already connected")]
    AlreadyConnected,

    #[error("Magnet {0:?} does not exist")]
    MissingMagnet(MagnetRef),
}

/// A user-facing problem that blocks submission. Collected, never raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("Cable '{connector}' joins {source_type} to {dest_type}")]
    TypeMismatch {
        connector: ConnectorId,
        source_type: Datatype,
        dest_type: Datatype,
    },

    #[error("Input '{input}' of step '{step_name}' is not connected")]
    UnfedInput {
        shape: ShapeId,
        step_name: String,
        input: String,
    },

    #[error("Output '{name}' is not connected to anything")]
    UnfedOutput { shape: ShapeId, name: String },

    #[error("Steps {} form a cycle", join_ids(.steps))]
    Cycle { steps: Vec<ShapeId> },

    #[error("The name '{name}' is used by more than one pipeline {role}")]
    DuplicateName { name: String, role: &'static str },

    #[error("The pipeline has no steps")]
    NoSteps,
}

fn join_ids(ids: &[ShapeId]) -> String {
    ids.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
}

impl ValidationIssue {
    /// The shapes this issue should be drawn next to.
    pub fn shapes(&self) -> Vec<ShapeId> {
        match self {
            ValidationIssue::UnfedInput { shape, .. } | ValidationIssue::UnfedOutput { shape, .. } => {
                vec![*shape]
            }
            ValidationIssue::Cycle { steps } => steps.clone(),
            _ => Vec::new(),
        }
    }
}

/// Errors that can occur while turning a canvas into a pipeline document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializeError {
    #[error("Steps cannot be numbered because they form a cycle: {0:?}")]
    Cycle(Vec<ShapeId>),

    #[error("Output '{0}' has no source cable")]
    UnsourcedOutput(String),

    #[error("Failed to encode pipeline JSON: {0}")]
    Json(String),

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Errors that can occur while rebuilding a canvas from a pipeline document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to parse pipeline JSON: {0}")]
    JsonParseError(String),

    #[error("Step {step_num} takes '{name}' from a pipeline input that does not exist")]
    UnknownPipelineInput { step_num: usize, name: String },

    #[error("Step {step_num} references step {source_step}, which has not been created yet")]
    ForwardReference { step_num: usize, source_step: usize },

    #[error("Output '{output}' takes '{name}' from a pipeline input that does not exist")]
    UnknownOutputSource { output: String, name: String },

    #[error("Output '{output}' references step {source_step}, which does not exist")]
    UnknownSourceStep { output: String, source_step: usize },

    #[error("Step {source_step} has no output named '{name}'")]
    UnknownStepOutput { source_step: usize, name: String },

    #[error("Step {step_num} has no input named '{name}'")]
    UnknownStepInput { step_num: usize, name: String },

    #[error("Step {step_num} has {cables} incoming cables but only {inputs} inputs")]
    TooManyCables {
        step_num: usize,
        cables: usize,
        inputs: usize,
    },

    #[error("Cable into '{target}' was rejected: {rejection}")]
    RejectedCable {
        target: String,
        rejection: ConnectRejection,
    },

    #[error("Coordinate ({x}, {y}) is not a finite number")]
    InvalidCoordinate { x: f64, y: f64 },

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::JsonParseError(e.to_string())
    }
}

/// Failures of best-effort draft storage. All of them are recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DraftError {
    #[error("Draft of {size} bytes exceeds the storage quota of {quota} bytes")]
    QuotaExceeded { size: usize, quota: usize },

    #[error("Stored draft '{key}' is corrupted: {message}")]
    Corrupted { key: String, message: String },

    #[error("Draft storage I/O failed: {0}")]
    Io(String),

    #[error("Draft snapshot cannot be restored: {0}")]
    InvalidSnapshot(String),
}

/// A failed request to the backend, reduced to something showable.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}
