//! services/api/src/lib.rs
//!
//! The HTTP service crate: configuration, adapters over the core ports,
//! and the axum web layer. The `api` binary wires these together.

pub mod adapters;
pub mod config;
pub mod entitlements;
pub mod error;
pub mod web;
