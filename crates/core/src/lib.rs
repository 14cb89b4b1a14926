//! StoreDesk Core - Shared domain types.
//!
//! This crate provides the records managed by the dashboard and the traits
//! that describe how they are stored:
//! - `admin` - Dashboard server and entity containers
//! - `cli` - Command-line tools for listing, deleting and seeding records
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! Records are converted to and from plain JSON field maps here; the admin
//! crate owns the mapping from those maps onto the document database wire
//! format.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, statuses, entity records and the document traits

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
