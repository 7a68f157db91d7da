pub mod models;
pub mod queue;
pub mod registry;
pub mod staff;
pub mod kitchen;
pub mod delivery;
pub mod stats;
pub mod orchestrator;

pub use models::{format_cents, LineItem, MenuItemRef, OrderFactory, OrderRecord, SharedOrder};
pub use queue::{PriorityOrderQueue, DEFAULT_PRIORITY, HIGHEST_PRIORITY, LOWEST_PRIORITY};
pub use registry::StaffAssignmentRegistry;
pub use staff::{DeliveryWorker, KitchenWorker, StaffMember, StaffRole, StaffWorker};
pub use kitchen::KitchenCoordinator;
pub use delivery::DeliveryCoordinator;
pub use stats::{RestaurantStats, StatisticsSink, StatsSnapshot};
pub use orchestrator::{
    DailyReport, Handoff, PriorityPolicy, RestaurantOrchestrator, RestaurantStatus, Submission,
};
