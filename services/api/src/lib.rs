//! services/api/src/lib.rs
//!
//! Library crate for the API service. The `api` and `openapi` binaries pull
//! the adapters, configuration and web layer from here.

pub mod adapters;
pub mod config;
pub mod error;
pub mod sweep;
pub mod web;
