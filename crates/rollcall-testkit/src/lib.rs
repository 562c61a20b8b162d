//! # Rollcall Testkit
//!
//! Testing utilities for Rollcall.
//!
//! ## Overview
//!
//! - **Fixtures**: A workshop wired to in-memory stores, with handles to
//!   both stores for fault injection and inspection
//! - **Generators**: Proptest strategies for names and submission sequences
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use rollcall_testkit::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new().await;
//!     fixture.remote.set_online(false);
//!     fixture.workshop.submit("Ann", "session1").await.unwrap();
//!     assert!(fixture.workshop.sync_status().await.sync_required);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use rollcall_testkit::generators::valid_name;
//!
//! proptest! {
//!     #[test]
//!     fn accepted(name in valid_name()) {
//!         prop_assert!(rollcall_core::validate_name(&name).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{init_tracing, small_catalog, TestFixture};
pub use generators::{invalid_name, submissions, valid_name, Submission};
