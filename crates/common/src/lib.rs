//! Shared value types for the CloudShop backend.
//!
//! Identifiers are newtype wrappers so order, user, and product ids
//! cannot be mixed up, and money is carried in exact cents everywhere
//! except the JSON wire boundary.

pub mod types;

pub use types::{Money, OrderId, ProductId, UserId};
