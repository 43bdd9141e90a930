pub mod config;
pub mod distribution;
pub mod errors;
pub mod run;

pub use config::*;
pub use distribution::*;
pub use errors::*;
pub use run::*;
