//! Test utilities and helpers for the rockslice crates.
//!
//! This crate provides:
//! - [`spy::SpyEngine`], an engine wrapper that records every call made to it
//! - Seeded data generation for property-style tests
//!
//! # Usage
//!
//! This crate is intended for use within the rockslice test suites only.

pub mod data_gen;
pub mod spy;

pub use spy::SpyEngine;
