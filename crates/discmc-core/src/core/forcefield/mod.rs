pub mod params;
pub mod potentials;

pub use params::ForceField;
