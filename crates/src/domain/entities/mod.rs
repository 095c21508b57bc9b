pub mod audit_logs;
pub mod daily_snapshots;
pub mod membership_active_items;
pub mod notification_logs;
pub mod subscriptions;
pub mod transactions;
