//! # Demarc Testkit
//!
//! Test utilities for demarc.
//!
//! This crate provides:
//! - A sample bean catalog and a Java-style error class tree
//! - A recording transaction manager with failure injection
//! - A counting metadata provider
//! - Property-based test generators using proptest
//! - Concurrency stress helpers for the attribute resolver
//! - Test logging setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use demarc_testkit::prelude::*;
//!
//! #[test]
//! fn commits_on_success() {
//!     let beans = BeanCatalog::new();
//!     let manager = RecordingTransactionManager::new();
//!     // ... build an interceptor and invoke
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod manager;
pub mod provider;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::manager::*;
    pub use crate::provider::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use manager::*;
pub use provider::*;
pub use stress::*;
