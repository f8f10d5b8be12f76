//! udimpack End-to-End Test Infrastructure
//!
//! Builds scenes and UDIM texture sets on disk, runs a combine through the
//! library pipeline and reads the results back.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p udimpack-tests
//! ```

pub mod fixtures;
pub mod harness;
