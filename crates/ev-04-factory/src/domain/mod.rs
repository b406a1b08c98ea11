//! # Domain Layer
//!
//! Factory configuration, deployment records and errors.

pub mod config;
pub mod entities;
pub mod errors;
