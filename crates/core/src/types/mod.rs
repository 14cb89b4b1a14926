//! Core types for StoreDesk.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the four entity records kept by the dashboard.

pub mod category;
pub mod document;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
pub mod user;

pub use category::{Category, CategoryDraft, CategoryPatch};
pub use document::{Document, Editable, Entity, Fields, FieldsError, merge_fields};
pub use id::*;
pub use order::{Order, OrderDraft, OrderPatch, UNKNOWN_CUSTOMER};
pub use price::{Price, PriceError};
pub use product::{Product, ProductDraft, ProductPatch};
pub use status::*;
pub use user::{DailyClaim, User};
