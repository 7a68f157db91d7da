use std::fmt;

use bistro_core::{DispatchError, DispatchResult};
use bistro_shared::{OrderId, StaffId};
use serde::{Deserialize, Serialize};

use crate::models::SharedOrder;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Chef,
    Delivery,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chef => write!(f, "Chef"),
            Self::Delivery => write!(f, "Delivery"),
        }
    }
}

/// Plain staff record. Behaviour lives in the coordinators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub role: StaffRole,
}

impl StaffMember {
    pub fn new(id: StaffId, name: impl Into<String>, role: StaffRole) -> DispatchResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DispatchError::InvalidArgument(
                "Staff member must have a name".to_string(),
            ));
        }
        Ok(Self { id, name, role })
    }

    pub fn chef(id: StaffId, name: impl Into<String>) -> DispatchResult<Self> {
        Self::new(id, name, StaffRole::Chef)
    }

    pub fn courier(id: StaffId, name: impl Into<String>) -> DispatchResult<Self> {
        Self::new(id, name, StaffRole::Delivery)
    }

    /// Short badge: role initial plus zero-padded id, e.g. `D007`.
    pub fn badge(&self) -> String {
        let prefix = match self.role {
            StaffRole::Chef => 'C',
            StaffRole::Delivery => 'D',
        };
        format!("{}{:03}", prefix, self.id)
    }
}

impl fmt::Display for StaffMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.role, self.name, self.badge())
    }
}

/// Anything on the roster.
pub trait StaffWorker: Send + Sync {
    fn member(&self) -> &StaffMember;

    fn is_busy(&self) -> bool;

    fn id(&self) -> StaffId {
        self.member().id
    }
}

/// Takes orders from placement to ready-for-delivery.
pub trait KitchenWorker: StaffWorker {
    fn receive_order(&self, order: SharedOrder) -> DispatchResult<()>;
    fn start_preparing(&self, order_id: OrderId) -> DispatchResult<()>;
    fn complete_order(&self, order_id: OrderId) -> DispatchResult<()>;
    fn cancel_order(&self, order_id: OrderId) -> DispatchResult<()>;
}

/// Takes ready orders to the customer.
pub trait DeliveryWorker: StaffWorker {
    fn assign_order(&self, order: SharedOrder) -> DispatchResult<()>;
    fn pickup_order(&self, order_id: OrderId) -> DispatchResult<()>;
    fn deliver_order(&self, order_id: OrderId) -> DispatchResult<SharedOrder>;
}
