mod geometry;

pub use geometry::{GeometryError, GeometryTemplate};
