pub mod dataset;
pub mod geometry;
mod spatial;

pub use dataset::{CsvOptions, Dataset, ImpactRecord};
pub use geometry::{BBox, GeometryStore, Polygon, Region, Ring};
