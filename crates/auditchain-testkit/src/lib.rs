//! # auditchain testkit
//!
//! Testing utilities for auditchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: A fixed chain with expected digests, pinning the
//!   canonical encoding and hash construction
//! - **Generators**: Proptest strategies for inputs, payloads and whole chains
//! - **Fixtures**: A memory-backed trail and demo seed data
//!
//! ## Golden Vectors
//!
//! ```rust
//! use auditchain_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, hex) in verify_all_vectors() {
//!     assert!(matches, "{name}: {hex}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use auditchain_core::verify_chain;
//! use auditchain_testkit::generators::chain;
//!
//! proptest! {
//!     #[test]
//!     fn sealed_chains_verify(events in chain(16)) {
//!         prop_assert!(verify_chain(&events, None).is_valid);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use auditchain_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! fixture.log_many(3, "user-1").await;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{csv_record_count, demo_session_inputs, flip_hex_char, TestFixture};
pub use vectors::{all_vectors, golden_chain, GoldenVector};
