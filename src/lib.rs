pub mod bunch;
pub mod config;
pub mod constants;
pub mod grid;
pub mod output;
pub mod sampler;
pub mod simulation;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use bunch::{Bunch, BunchShape};
pub use config::{BeamKinematics, BunchConfig, SimulationConfig};
pub use grid::{BinAxis, Binning, Grid1, Grid2, Grid3};
pub use output::{FileSink, ProfileFormat, ProfileSink, TimeProfiles};
pub use sampler::{TruncatedGaussian, TRUNCATION_SIGMAS};
pub use simulation::Simulation;
pub use vecmath::Vec3;
