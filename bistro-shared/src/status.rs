use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status in the kitchen-to-door lifecycle.
///
/// The only legal moves are single steps forward:
/// `Placed -> Preparing -> ReadyForDelivery -> OutForDelivery -> Delivered`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Preparing,
    ReadyForDelivery,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Placed,
        Self::Preparing,
        Self::ReadyForDelivery,
        Self::OutForDelivery,
        Self::Delivered,
    ];

    /// The single status this one may advance to, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            Self::Placed => Some(Self::Preparing),
            Self::Preparing => Some(Self::ReadyForDelivery),
            Self::ReadyForDelivery => Some(Self::OutForDelivery),
            Self::OutForDelivery => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placed => write!(f, "Placed"),
            Self::Preparing => write!(f, "Preparing"),
            Self::ReadyForDelivery => write!(f, "ReadyForDelivery"),
            Self::OutForDelivery => write!(f, "OutForDelivery"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Placed" | "PLACED" => Ok(Self::Placed),
            "Preparing" | "PREPARING" => Ok(Self::Preparing),
            "ReadyForDelivery" | "READY_FOR_DELIVERY" => Ok(Self::ReadyForDelivery),
            "OutForDelivery" | "OUT_FOR_DELIVERY" => Ok(Self::OutForDelivery),
            "Delivered" | "DELIVERED" => Ok(Self::Delivered),
            _ => Err(format!("Invalid order status: {s}")),
        }
    }
}
