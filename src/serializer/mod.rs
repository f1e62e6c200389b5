//! Mapping between a canvas and the backend's pipeline JSON document.
//!
//! Coordinates on the wire are fractions of the canvas size at save time, so a
//! diagram reloads at the same relative layout on a canvas of any size.

mod load;
mod save;
mod wire;

pub use load::{load_document, load_json};
pub use save::{to_document, to_json};
pub use wire::*;
