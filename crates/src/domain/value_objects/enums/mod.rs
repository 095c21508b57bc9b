pub mod change_reasons;
pub mod notification_statuses;
pub mod payment_item_types;
pub mod payment_providers;
pub mod sort_order;
pub mod subscription_statuses;
