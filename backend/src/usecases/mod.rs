pub mod entitlements;
pub mod notifications;
pub mod statistics;
pub mod verify;
