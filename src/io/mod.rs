/// Command-line interface for tiling preview runs
pub mod cli;
/// Default constants for geometry and output
pub mod configuration;
/// Error taxonomy and result alias
pub mod error;
/// PNG conversion to and from numeric arrays
pub mod image;
/// Multi-file progress display
pub mod progress;
