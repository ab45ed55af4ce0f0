//! Core types and pipeline for the adoload backlog loader.
//!
//! The pipeline turns a three-level backlog plan (features, user stories,
//! tasks) into work items in a remote tracker: templates map input keys to
//! field paths ([`template`]), raw values are coerced to declared types
//! ([`transform`]), one payload is built per node ([`payload`]), and the
//! hierarchy loader ([`loader`]) creates items top-down through a
//! [`client::WorkItemClient`], wiring parent links from the returned ids.

pub mod client;
pub mod loader;
pub mod markup;
pub mod payload;
pub mod record;
pub mod template;
pub mod transform;
pub mod value;
