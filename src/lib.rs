//! reelsmith library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod assets;
pub mod cli;
pub mod config;
pub mod publish;
pub mod reel;
