//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the drydock crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use drydock::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/pipeline.json")?;
//! let mut canvas = CanvasState::builder(1024.0, 768.0).build()?;
//! serializer::load_json(&mut canvas, &json)?;
//!
//! match canvas.execution_order() {
//!     Ok(order) => println!("{} steps in order", order.len()),
//!     Err(cycle) => println!("cycle through {:?}", cycle.steps),
//! }
//! # Ok(())
//! # }
//! ```

// Canvas and interaction
pub use crate::canvas::render::{DisplayList, Surface};
pub use crate::canvas::{
    CanvasBuilder, CanvasConfig, CanvasState, CollisionPolicy, GestureOutcome, InteractionMode,
    Key, Modifiers, Propagation, StepCycle,
};
pub use crate::menu::{ContextMenu, MenuContext};

// Model
pub use crate::geometry::{Point, Rect};
pub use crate::model::{
    Connector, ConnectorId, Datatype, Direction, MagnetRef, NodeKind, Shape, ShapeId, StepPort,
};

// Wire format and collaborators
pub use crate::serializer::{self, PipelineDocument};
pub use crate::session::{Command, Effect, Session};

// Error types
pub use crate::error::{
    ApiError, CanvasError, ConnectRejection, DraftError, LoadError, SerializeError,
    ValidationIssue,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
