//! Domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the catalog and
//! bill-of-quantities modules (no IO, no storage, no formatting).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot, execute};
pub use entity::{Entity, position_of};
pub use error::{DomainError, DomainResult};
pub use id::{CollectionId, ItemId};
