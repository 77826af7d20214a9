//! Core types, configuration and errors for the alien invasion simulation.

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use types::*;
