//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the renderer:
//! - Namespaced identifiers
//! - Math types and the transform stack
//! - Logging utilities

pub mod identifier;
pub mod math;
pub mod logging;
