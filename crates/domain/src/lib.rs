//! Domain layer for the CloudShop backend.
//!
//! This crate provides the structured records shared by the intake
//! service, the fulfillment worker, and the HTTP surface:
//! - Order record with its status state machine
//! - Fulfillment job snapshot carried on the work queue
//! - Boundary validation for order creation requests
//! - Catalog, cart, and interaction-event records

pub mod cart;
pub mod draft;
pub mod error;
pub mod interaction;
pub mod job;
pub mod order;
pub mod product;

pub use cart::{Cart, CartItem};
pub use draft::{LineItemDraft, OrderDraft, ProductSnapshotDraft, ShippingInfoDraft};
pub use error::ValidationError;
pub use interaction::{EventType, InteractionEvent};
pub use job::FulfillmentJob;
pub use order::{LineItem, Order, OrderStatus, ProductSnapshot, ShippingInfo};
pub use product::Product;

pub use common::{Money, OrderId, ProductId, UserId};
