pub mod point;
pub mod selection;
pub mod stats;
pub mod config;
pub mod errors;

pub use point::*;
pub use selection::*;
pub use stats::*;
pub use config::*;
pub use errors::*;
