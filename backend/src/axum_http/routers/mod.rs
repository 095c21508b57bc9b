pub mod admin;
pub mod payment_v2;
pub mod user;
