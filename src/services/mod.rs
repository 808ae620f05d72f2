//! Business logic between the HTTP handlers and the stores.

pub mod accounts;
pub mod orders;
pub mod tracking;

pub use accounts::{AccountService, AuthRes, ProfileRes};
pub use orders::{OrderService, OrderSettings};
pub use tracking::{TrackingInput, TrackingService};
