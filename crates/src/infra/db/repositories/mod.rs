pub mod audit_logs;
pub mod entitlements;
pub mod filters;
pub mod notification_logs;
pub mod snapshots;
pub mod statistics;
pub mod transactions;
