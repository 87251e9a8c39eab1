pub mod generator;

pub use generator::{DocumentGenerator, RenderError};
