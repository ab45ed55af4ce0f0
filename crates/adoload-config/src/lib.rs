//! Run configuration for the adoload backlog loader.
//!
//! This crate loads and validates `parameters.yaml`, applies environment
//! variable overrides, and hands the rest of the system an immutable,
//! fully-validated [`params::Parameters`] value.

pub mod params;

pub use params::{ConfigError, Parameters, load_parameters};
