/// Batch construction for training and inference
pub mod batch;
/// Explicit tiling geometry
pub mod config;
/// Model trait and whole-image prediction
pub mod predict;

pub use config::TilingConfig;
pub use predict::{PatchModel, predict_image};
