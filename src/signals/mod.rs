//! Change notifications for the deal pipeline.
//!
//! Every write publishes a [`bus::DealEvent`]. Listeners react synchronously
//! inside `publish`; the dashboard cache in [`invalidation`] is the main one.

pub mod bus;
pub mod invalidation;

pub use bus::{DealEvent, DealEventListener, EventBus, WriteLeg};
pub use invalidation::DashboardCache;
