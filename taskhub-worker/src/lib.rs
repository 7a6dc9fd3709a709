//! # TaskHub Worker Library
//!
//! Background jobs that run outside the request path.
//!
//! ## Modules
//!
//! - `scheduler`: Spawns instances of recurring tasks when they fall due
//! - `config`: Environment configuration for the worker binary

pub mod config;
pub mod scheduler;
