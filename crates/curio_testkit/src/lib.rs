//! # Curio Testkit
//!
//! Test utilities for the Curio sync core.
//!
//! This crate provides:
//! - Fixture builders for documents, change events, and seeded stores
//! - Property-based generators using proptest

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
