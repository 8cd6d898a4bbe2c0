//! # bundlegraph
//!
//! Library surface of the bundlegraph binary: the CLI definition and its
//! command implementations, exposed for integration tests.

pub mod cli;
