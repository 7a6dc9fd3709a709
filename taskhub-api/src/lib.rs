//! # TaskHub API Server Library
//!
//! HTTP surface of the multi-tenant task service.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with envelope rejections
//! - `middleware`: Authentication and security headers
//! - `response`: Success envelope helpers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
