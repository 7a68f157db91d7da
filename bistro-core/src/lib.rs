pub mod identity;
pub mod notifier;

pub use identity::OrderIdGenerator;
pub use notifier::{InMemoryNotifier, StatusNotifier, TracingNotifier};

use bistro_shared::{OrderId, OrderStatus};

/// Failure kinds shared by the queue, the registry and the coordinators.
///
/// Every operation checks its preconditions before writing, so an `Err`
/// always means nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot perform '{operation}' on Order #{order_id} in state '{from}'")]
    InvalidStateTransition {
        order_id: OrderId,
        from: OrderStatus,
        operation: String,
    },

    #[error("Order #{0} is already assigned to a delivery worker")]
    AlreadyAssigned(OrderId),

    #[error("Queue is empty")]
    Empty,

    #[error("Restaurant is closed")]
    RestaurantClosed,

    #[error("Staffing error: {0}")]
    Staffing(String),
}

impl DispatchError {
    pub fn order_not_found(order_id: OrderId) -> Self {
        DispatchError::NotFound(format!("Order #{} not found", order_id))
    }

    pub fn invalid_transition(order_id: OrderId, from: OrderStatus, operation: impl Into<String>) -> Self {
        DispatchError::InvalidStateTransition {
            order_id,
            from,
            operation: operation.into(),
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_message_names_order_and_state() {
        let err = DispatchError::invalid_transition(12, OrderStatus::ReadyForDelivery, "start preparing");
        assert_eq!(
            err.to_string(),
            "Cannot perform 'start preparing' on Order #12 in state 'ReadyForDelivery'"
        );
    }
}
