//! # Drydock - Pipeline Diagram Canvas
//!
//! **Drydock** is the model behind an interactive pipeline editor. Users place
//! data inputs, processing steps, and outputs on a canvas, pull cables between
//! their magnets, and submit the result to a backend as a JSON pipeline
//! document. Drydock owns everything except the pixels: hit-testing, the drag
//! state machine, collision handling, execution ordering, validation, and the
//! wire format.
//!
//! ## Core Workflow
//!
//! 1.  **Build a Canvas**: Use `CanvasState::builder` to configure the canvas size and interaction tunables.
//! 2.  **Populate It**: Add shapes directly, feed pointer events through the interaction methods, or load a `PipelineDocument`.
//! 3.  **Validate**: `CanvasState::validate` collects every issue that blocks submission; `execution_order` numbers the steps.
//! 4.  **Serialize**: `serializer::to_document` produces the resolution-independent wire document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drydock::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut canvas = CanvasState::builder(800.0, 600.0).build()?;
//!
//!     let reads = canvas.add_shape(
//!         NodeKind::RawData { name: "reads.csv".to_string() },
//!         Point::new(100.0, 300.0),
//!     );
//!     let align = canvas.add_shape(
//!         NodeKind::Step {
//!             name: "align".to_string(),
//!             transformation_pk: 12,
//!             family_pk: 3,
//!             inputs: vec![StepPort::any("reads")],
//!             outputs: vec![StepPort::any("alignment")],
//!         },
//!         Point::new(400.0, 300.0),
//!     );
//!     canvas.connect(MagnetRef::output(reads, 0), MagnetRef::input(align, 0))?;
//!
//!     for issue in canvas.validate() {
//!         println!("-> {}", issue);
//!     }
//!
//!     let document = serializer::to_document(&canvas)?;
//!     println!("{}", document.to_json_pretty()?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod canvas;
pub mod draft;
pub mod error;
pub mod geometry;
pub mod menu;
pub mod model;
pub mod prelude;
pub mod serializer;
pub mod session;
