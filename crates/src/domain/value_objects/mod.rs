pub mod common_filters;
pub mod entitlements;
pub mod enums;
pub mod payment_items;
pub mod statistics;
pub mod subscription_periods;
pub mod transactions;
