pub mod app;
pub mod disks;
pub mod error;
pub mod grid;
pub mod linear;
pub mod mesh;
pub mod nonlinear;
pub mod physics;
pub mod pipeline;
pub mod scheme;
pub mod traits;

pub use app::ModelParams;
pub use error::{Error, Result};
pub use grid::VelocityField;
pub use pipeline::{run, run_many, run_with_source, WakeModel};
