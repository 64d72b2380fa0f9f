//! # DevKB Core
//!
//! Shared logic for DevKB: the knowledge entry model, the store
//! abstraction, the substring query engine, the templated ask responder,
//! and aggregate statistics.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. The `devkb`
//! application crate wires it to an axum server and a CLI.

pub mod ask;
pub mod models;
pub mod query;
pub mod stats;
pub mod store;
