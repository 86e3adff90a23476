// src/lib.rs

pub mod app;
pub mod cli;
pub mod core;
pub mod error;
pub mod logging;
pub mod output;
