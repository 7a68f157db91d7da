pub mod models;
pub mod status;

pub use models::events::OrderStatusChangedEvent;
pub use status::OrderStatus;

/// Numeric order identifier, handed out by an injected generator.
pub type OrderId = u64;

/// Numeric staff identifier.
pub type StaffId = u64;

/// Opaque customer reference owned by the checkout side.
pub type CustomerId = String;
