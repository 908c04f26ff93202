//! Simulation utilities and program loading.
//!
//! Provides utilities for loading binaries into memory and setting up
//! the initial system state for simulation.

pub mod loader;
