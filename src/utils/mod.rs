//! # Utility Modules
//!
//! This module contains utility functions, constants, and patterns used
//! throughout the crate.
//!
//! ## Available Utilities
//!
//! - **Constants** (`constant`) - Thumbnail defaults and resource ceilings
//! - **File** (`file`) - Filesystem seam and file saving helpers
//! - **Environment** (`static_object`) - Env-driven settings for the reference host
//! - **Patterns** (`validator`) - Placeholder, alias and filename regexes

pub mod constant;
pub mod file;
pub mod static_object;
pub mod validator;
