// src/commands/mod.rs
pub mod args;
mod api;
mod helpers;
mod verb;

pub use api::Commands;
pub use verb::{help_text, Verb};
