//! Fuzzing library for refgraph.
//!
//! This crate provides fuzzing targets for identifier parsing and for
//! JSON deserialization of the provider wire models.
//!
//! # Usage
//!
//! ```bash
//! cd crates/refgraph-fuzz
//! cargo +nightly fuzz run fuzz_identifier_parse -- -max_total_time=60
//! ```

pub use refgraph::models;
