// Public modules so the admin binary (and tests) can use them
pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod utils;

pub use commands::{Commands, Verb};
pub use config::CoreConfig;
pub use error::{AdminError, Result};
