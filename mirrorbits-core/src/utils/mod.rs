// src/utils/mod.rs
pub mod logbook;
pub mod urls;
