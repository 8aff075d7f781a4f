pub mod descriptor;
mod geometry;
mod projection;
mod renderer;

pub use descriptor::{render, ColorScale, RenderDescriptor, RenderedRegion, ValueRange, CLASS_COUNT};
pub use projection::Viewport;
pub use renderer::{DisplaySettings, MapLayers, MapRenderer};
