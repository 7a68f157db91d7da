use std::fmt;

use bistro_core::{DispatchError, DispatchResult};
use bistro_shared::OrderId;
use parking_lot::Mutex;

use crate::models::SharedOrder;

pub const HIGHEST_PRIORITY: u8 = 1;
pub const LOWEST_PRIORITY: u8 = 5;
pub const DEFAULT_PRIORITY: u8 = 3;

#[derive(Debug, Clone)]
struct QueueNode {
    order: SharedOrder,
    priority: u8,
    sequence: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    nodes: Vec<QueueNode>,
    next_sequence: u64,
}

impl QueueState {
    fn insert_node(&mut self, order: SharedOrder, priority: u8) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let position = self
            .nodes
            .iter()
            .position(|node| {
                node.priority > priority || (node.priority == priority && node.sequence > sequence)
            })
            .unwrap_or(self.nodes.len());

        self.nodes.insert(
            position,
            QueueNode {
                order,
                priority,
                sequence,
            },
        );
    }

    fn position_of(&self, order_id: OrderId) -> Option<usize> {
        self.nodes.iter().position(|node| node.order.id() == order_id)
    }
}

/// Kitchen queue ordered by priority tier, then by insertion sequence.
///
/// Every mutation holds the queue lock for the whole read-position-write, so
/// concurrent producers and consumers always see a consistent ordering.
#[derive(Debug, Default)]
pub struct PriorityOrderQueue {
    state: Mutex<QueueState>,
}

impl PriorityOrderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts behind every order of the same or higher priority.
    pub fn insert(&self, order: SharedOrder, priority: u8) -> DispatchResult<()> {
        validate_priority(priority)?;

        let mut state = self.state.lock();
        if state.position_of(order.id()).is_some() {
            return Err(DispatchError::InvalidArgument(format!(
                "Order #{} is already queued",
                order.id()
            )));
        }
        tracing::debug!(order_id = order.id(), priority, "Order queued");
        state.insert_node(order, priority);
        Ok(())
    }

    /// Inserts with [`DEFAULT_PRIORITY`].
    pub fn push(&self, order: SharedOrder) -> DispatchResult<()> {
        self.insert(order, DEFAULT_PRIORITY)
    }

    pub fn dequeue(&self) -> DispatchResult<SharedOrder> {
        let mut state = self.state.lock();
        if state.nodes.is_empty() {
            return Err(DispatchError::Empty);
        }
        Ok(state.nodes.remove(0).order)
    }

    pub fn peek(&self) -> Option<SharedOrder> {
        self.state.lock().nodes.first().map(|node| node.order.clone())
    }

    pub fn remove_by_id(&self, order_id: OrderId) -> DispatchResult<SharedOrder> {
        let mut state = self.state.lock();
        let position = state
            .position_of(order_id)
            .ok_or_else(|| DispatchError::order_not_found(order_id))?;
        Ok(state.nodes.remove(position).order)
    }

    /// Re-files an order under a new tier.
    ///
    /// The order gets a fresh insertion sequence, so it lands behind every
    /// order already waiting in the new tier, and ahead of any added later,
    /// regardless of when it originally arrived.
    pub fn update_priority(&self, order_id: OrderId, new_priority: u8) -> DispatchResult<()> {
        validate_priority(new_priority)?;

        let mut state = self.state.lock();
        let position = state
            .position_of(order_id)
            .ok_or_else(|| DispatchError::order_not_found(order_id))?;
        let node = state.nodes.remove(position);
        tracing::debug!(order_id, from = node.priority, to = new_priority, "Order re-prioritized");
        state.insert_node(node.order, new_priority);
        Ok(())
    }

    /// Swaps in a new record for a queued order, keeping its tier.
    ///
    /// Like [`update_priority`](Self::update_priority), the replacement is
    /// re-sequenced as a fresh arrival.
    pub fn replace(&self, order_id: OrderId, order: SharedOrder) -> DispatchResult<()> {
        if order.id() != order_id {
            return Err(DispatchError::InvalidArgument(format!(
                "Replacement for Order #{} carries id {}",
                order_id,
                order.id()
            )));
        }

        let mut state = self.state.lock();
        let position = state
            .position_of(order_id)
            .ok_or_else(|| DispatchError::order_not_found(order_id))?;
        let priority = state.nodes.remove(position).priority;
        state.insert_node(order, priority);
        Ok(())
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.state.lock().position_of(order_id).is_some()
    }

    pub fn get(&self, order_id: OrderId) -> DispatchResult<SharedOrder> {
        let state = self.state.lock();
        state
            .position_of(order_id)
            .map(|position| state.nodes[position].order.clone())
            .ok_or_else(|| DispatchError::order_not_found(order_id))
    }

    pub fn priority_of(&self, order_id: OrderId) -> Option<u8> {
        let state = self.state.lock();
        state.position_of(order_id).map(|position| state.nodes[position].priority)
    }

    pub fn all_in_priority_order(&self) -> Vec<SharedOrder> {
        self.state
            .lock()
            .nodes
            .iter()
            .map(|node| node.order.clone())
            .collect()
    }

    pub fn by_priority(&self, priority: u8) -> Vec<SharedOrder> {
        self.state
            .lock()
            .nodes
            .iter()
            .filter(|node| node.priority == priority)
            .map(|node| node.order.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().nodes.is_empty()
    }

    pub fn clear(&self) {
        self.state.lock().nodes.clear();
    }

    /// Point-in-time snapshot in dequeue order. Later queue changes are not
    /// reflected, and dropping or consuming the iterator never touches the queue.
    pub fn iter(&self) -> std::vec::IntoIter<SharedOrder> {
        self.all_in_priority_order().into_iter()
    }
}

impl<'a> IntoIterator for &'a PriorityOrderQueue {
    type Item = SharedOrder;
    type IntoIter = std::vec::IntoIter<SharedOrder>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for PriorityOrderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        write!(f, "OrderQueue [")?;
        for (i, node) in state.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "Order#{}(P{})", node.order.id(), node.priority)?;
        }
        write!(f, "]")
    }
}

fn validate_priority(priority: u8) -> DispatchResult<()> {
    if !(HIGHEST_PRIORITY..=LOWEST_PRIORITY).contains(&priority) {
        return Err(DispatchError::InvalidArgument(format!(
            "Priority must be between {} (highest) and {} (lowest), got {}",
            HIGHEST_PRIORITY, LOWEST_PRIORITY, priority
        )));
    }
    Ok(())
}
