pub mod pricing;
pub mod reconciler;
pub mod service;

pub use pricing::{total_cost, PricingConfig};
pub use reconciler::{OrderReconciler, ReconcilerConfig};
pub use service::OrderService;
