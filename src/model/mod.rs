mod connector;
mod datatype;
mod magnet;
mod shape;

pub use connector::*;
pub use datatype::*;
pub use magnet::*;
pub use shape::*;
