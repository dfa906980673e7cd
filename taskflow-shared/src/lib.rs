//! # TaskFlow Shared Library
//!
//! Business logic shared by the TaskFlow API server: entity models,
//! field validators, the storage port with its backends, and the user and
//! task services that enforce validation and referential integrity.
//!
//! ## Module Organization
//!
//! - `validators`: Pure field checks (email, non-empty text, enums, ids)
//! - `models`: User and Task records plus their request/patch schemas
//! - `storage`: Storage port, in-memory backend, PostgREST backend
//! - `services`: User and Task services and the composition root

pub mod models;
pub mod services;
pub mod storage;
pub mod validators;

/// Current version of the TaskFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
