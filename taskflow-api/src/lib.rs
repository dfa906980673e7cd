//! # TaskFlow API Server Library
//!
//! This library provides the HTTP layer of TaskFlow: configuration, the
//! axum router, request extraction, and the mapping of service errors to
//! JSON responses. Business rules live in `taskflow-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Lenient JSON body extractor
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
