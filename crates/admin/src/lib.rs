//! StoreDesk Admin library.
//!
//! This crate provides the dashboard as a library, allowing it to be tested
//! and reused by the CLI.
//!
//! # Layers
//!
//! - [`firestore`] - Firestore REST client and value codec
//! - [`store`] - `DocumentStore` trait (Firestore or in-memory)
//! - [`containers`] - one actor per entity owning its in-memory collection
//! - [`routes`] - server-rendered screens over the containers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod containers;
pub mod error;
pub mod filters;
pub mod firestore;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;
