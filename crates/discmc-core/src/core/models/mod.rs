pub mod configuration;
pub mod object;

pub use configuration::Configuration;
pub use object::{Object, Pose};
