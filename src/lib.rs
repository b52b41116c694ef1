//! camerpi library crate.
//!
//! Conversions, command assembly, and process plumbing behind the `camerpi`
//! binary, exposed for integration testing.

pub mod cameras;
pub mod capture;
pub mod config;
pub mod exposure;
pub mod runner;
