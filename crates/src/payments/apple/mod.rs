pub mod app_account_token;
pub mod client;
pub mod jws;
pub mod notification;
pub mod receipt;
