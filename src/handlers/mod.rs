//! # HTTP Request Handlers
//!
//! ## Available Handlers
//!
//! - **Health Check** (`health_check`) - Application health monitoring
//! - **Records** (`records`) - Record CRUD with a managed file attachment

mod health_check;
mod records;

pub use health_check::*;
pub use records::*;
