//! Clipvault - batch converter for raw video recordings
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod pipeline;
pub mod upload;
