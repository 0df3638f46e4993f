//! Shopfloor Core - Shared types library.
//!
//! This crate provides the types shared by every Shopfloor component:
//! - `api` - The catalog and cart HTTP service
//! - `cli` - Command-line tools for migrations and seeding
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
