use crates::domain::value_objects::payment_items::{PaymentItem, PaymentItemCatalog};
use crates::payments::apple::client::AppleIapOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Dev,
    Prod,
}

impl Stage {
    pub fn from_str(value: &str) -> Self {
        match value {
            "prod" => Stage::Prod,
            _ => Stage::Dev,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub env: Stage,
    pub server: Server,
    pub database: Database,
    pub metrics_addr: String,
    pub payment_items: Vec<PaymentItem>,
    pub apple_iap: AppleIapConfig,
}

impl DotEnvyConfig {
    pub fn catalog(&self) -> PaymentItemCatalog {
        PaymentItemCatalog::new(self.payment_items.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub dsn: String,
}

#[derive(Debug, Clone)]
pub struct AppleIapConfig {
    pub key_id: String,
    pub key_content: String,
    pub bundle_id: String,
    pub issuer: String,
    pub shared_secret: String,
    pub is_prod: bool,
}

impl AppleIapConfig {
    pub fn client_options(&self) -> AppleIapOptions {
        AppleIapOptions {
            key_id: self.key_id.clone(),
            key_content: self.key_content.clone(),
            bundle_id: self.bundle_id.clone(),
            issuer: self.issuer.clone(),
            shared_secret: self.shared_secret.clone(),
            sandbox: !self.is_prod,
        }
    }
}
