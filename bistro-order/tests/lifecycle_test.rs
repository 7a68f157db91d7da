use std::sync::Arc;

use bistro_core::{DispatchError, InMemoryNotifier, OrderIdGenerator};
use bistro_order::{
    DeliveryCoordinator, Handoff, KitchenCoordinator, LineItem, MenuItemRef, OrderFactory,
    PriorityOrderQueue, RestaurantOrchestrator, StaffAssignmentRegistry, StaffMember,
};
use bistro_shared::OrderStatus;
use tokio::sync::Barrier;

fn two_item_order(factory: &OrderFactory) -> bistro_order::SharedOrder {
    factory
        .create(
            "customer-42",
            vec![
                LineItem::new(MenuItemRef::new(1, "Loaded Fries"), 1, 399),
                LineItem::new(MenuItemRef::new(2, "Baked Potato"), 1, 499),
            ],
        )
        .unwrap()
}

#[test]
fn test_priority_then_arrival_order() {
    let factory = OrderFactory::default();
    let queue = PriorityOrderQueue::new();

    let low = two_item_order(&factory);
    let high = two_item_order(&factory);
    let lowest = two_item_order(&factory);
    queue.insert(low.clone(), 3).unwrap();
    queue.insert(high.clone(), 1).unwrap();
    queue.insert(lowest.clone(), 5).unwrap();

    let drained: Vec<u64> = std::iter::from_fn(|| queue.dequeue().ok())
        .map(|order| order.id())
        .collect();
    assert_eq!(drained, vec![high.id(), low.id(), lowest.id()]);
    assert_eq!(queue.dequeue().unwrap_err(), DispatchError::Empty);
}

#[test]
fn test_full_lifecycle_keeps_items_and_total() {
    let notifier = Arc::new(InMemoryNotifier::new());
    let registry = Arc::new(StaffAssignmentRegistry::new());
    let chef = KitchenCoordinator::new(StaffMember::chef(1, "Remy").unwrap(), notifier.clone());
    let courier = DeliveryCoordinator::new(
        StaffMember::courier(2, "Dana").unwrap(),
        registry.clone(),
        notifier.clone(),
    );

    let order = two_item_order(&OrderFactory::default());
    let order_id = order.id();
    let check = |expected: OrderStatus| {
        assert_eq!(order.status(), expected);
        assert_eq!(order.total_cents(), 898);
        assert_eq!(order.items().len(), 2);
    };

    check(OrderStatus::Placed);
    chef.receive_order(order.clone()).unwrap();
    chef.start_preparing(order_id).unwrap();
    check(OrderStatus::Preparing);
    chef.complete_order(order_id).unwrap();
    check(OrderStatus::ReadyForDelivery);
    courier.assign_order(order.clone()).unwrap();
    courier.pickup_order(order_id).unwrap();
    check(OrderStatus::OutForDelivery);
    courier.deliver_order(order_id).unwrap();
    check(OrderStatus::Delivered);

    assert!(!registry.is_assigned(order_id));
    assert_eq!(
        notifier.history(order_id),
        vec![
            OrderStatus::Preparing,
            OrderStatus::ReadyForDelivery,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ]
    );
}

#[test]
fn test_skipping_a_stage_is_rejected() {
    let notifier = Arc::new(InMemoryNotifier::new());
    let registry = Arc::new(StaffAssignmentRegistry::new());
    let courier = DeliveryCoordinator::new(
        StaffMember::courier(2, "Dana").unwrap(),
        registry.clone(),
        notifier.clone(),
    );

    let order = two_item_order(&OrderFactory::default());
    let err = courier.assign_order(order.clone()).unwrap_err();

    assert!(matches!(err, DispatchError::InvalidStateTransition { from: OrderStatus::Placed, .. }));
    assert_eq!(order.status(), OrderStatus::Placed);
    assert!(registry.is_empty());
    assert!(notifier.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_assignment_has_one_winner() {
    let notifier = Arc::new(InMemoryNotifier::new());
    let registry = Arc::new(StaffAssignmentRegistry::new());
    let chef = KitchenCoordinator::new(StaffMember::chef(1, "Remy").unwrap(), notifier.clone());

    let order = two_item_order(&OrderFactory::default());
    chef.receive_order(order.clone()).unwrap();
    chef.start_preparing(order.id()).unwrap();
    chef.complete_order(order.id()).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for staff_id in [10, 11] {
        let courier = Arc::new(DeliveryCoordinator::new(
            StaffMember::courier(staff_id, format!("Courier {}", staff_id)).unwrap(),
            registry.clone(),
            notifier.clone(),
        ));
        let barrier = barrier.clone();
        let order = order.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            courier.assign_order(order)
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|result| *result == Err(DispatchError::AlreadyAssigned(order.id()))));
    assert_eq!(registry.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_advance_moves_the_order_once() {
    let notifier = Arc::new(InMemoryNotifier::new());
    let order = two_item_order(&OrderFactory::default());

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let barrier = barrier.clone();
        let order = order.clone();
        let notifier = notifier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            order.advance(OrderStatus::Preparing, "start preparing", notifier.as_ref())
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(DispatchError::InvalidStateTransition { from: OrderStatus::Preparing, .. })
    )));
    assert_eq!(order.status(), OrderStatus::Preparing);
    assert_eq!(notifier.len(), 1);
}

#[test]
fn test_restaurant_shift_end_to_end() {
    let notifier = Arc::new(InMemoryNotifier::new());
    let restaurant = RestaurantOrchestrator::new(
        "Spud Shack",
        "1 Tater Lane",
        Arc::new(OrderIdGenerator::new()),
        notifier.clone(),
    );
    restaurant.add_chef(StaffMember::chef(1, "Remy").unwrap()).unwrap();
    restaurant.add_chef(StaffMember::chef(2, "Colette").unwrap()).unwrap();
    restaurant.add_courier(StaffMember::courier(10, "Dana").unwrap()).unwrap();
    restaurant.open().unwrap();

    let fries = MenuItemRef::new(1, "Loaded Fries");
    let big = restaurant
        .place_order("big", vec![LineItem::new(fries.clone(), 9, 399)])
        .unwrap();
    let small = restaurant
        .place_order("small", vec![LineItem::new(fries.clone(), 1, 399)])
        .unwrap();
    assert_eq!(big.priority, 5);
    assert_eq!(small.priority, 1);

    let started = restaurant.process_kitchen_queue();
    assert_eq!(started, vec![(small.order_id, 1), (big.order_id, 2)]);
    assert!(restaurant.queue().is_empty());

    assert_eq!(
        restaurant.advance_to_delivery(small.order_id, 1).unwrap(),
        Handoff::Assigned(10)
    );
    restaurant.pickup_order(small.order_id, 10).unwrap();
    assert_eq!(
        restaurant.advance_to_delivery(big.order_id, 2).unwrap(),
        Handoff::AwaitingCourier
    );

    restaurant.deliver_order(small.order_id, 10).unwrap();
    assert_eq!(restaurant.dispatch_ready_orders(), vec![(big.order_id, 10)]);
    restaurant.pickup_order(big.order_id, 10).unwrap();
    restaurant.deliver_order(big.order_id, 10).unwrap();

    let report = restaurant.close();
    assert_eq!(report.orders_processed, 2);
    assert_eq!(report.orders_delivered, 2);
    assert_eq!(report.revenue_cents, 399 * 10);
    assert_eq!(report.top_items, vec![("Loaded Fries".to_string(), 10)]);
    assert!(restaurant.registry().is_empty());
    assert_eq!(restaurant.completed_orders().len(), 2);
    assert_eq!(
        restaurant.place_order("late", vec![LineItem::new(fries, 1, 399)]),
        Err(DispatchError::RestaurantClosed)
    );
}
