pub mod config;
pub mod employee;
pub mod error;

pub use config::{EngineConfig, MissingFieldPolicy};
pub use employee::*;
pub use error::*;
