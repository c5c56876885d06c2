//! SHELF application library
//!
//! Project modules plus the bootstrap sequence shared by the `shelf-app` and
//! `shelf` binaries.

pub mod bootstrap;
pub mod modules;

/// Re-export commonly used types
pub use modules::*;
