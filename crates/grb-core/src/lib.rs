//! Core domain + application logic for the GPT relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the
//! completion service live behind ports (traits) implemented in adapter
//! crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod relay;

pub use errors::{Error, Result};
