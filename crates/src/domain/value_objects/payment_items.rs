use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::{
    payment_item_types::PaymentItemType, payment_providers::PaymentProvider,
};

/// A purchasable product as configured for one provider. The catalog is
/// loaded at startup and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentItem {
    pub id: String,
    pub provider_id: PaymentProvider,
    pub provider_item_id: String,
    #[serde(rename = "type")]
    pub item_type: PaymentItemType,
    /// Set for duration-based products, absent for provider-dated ones.
    pub duration_hours: Option<i64>,
}

impl PaymentItem {
    pub fn is_subscription(&self) -> bool {
        matches!(
            self.item_type,
            PaymentItemType::AutoRenewableSubscription | PaymentItemType::NonRenewableSubscription
        )
    }

    pub fn renewable(&self) -> bool {
        self.item_type == PaymentItemType::AutoRenewableSubscription
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentItemCatalog {
    items: Vec<PaymentItem>,
}

impl PaymentItemCatalog {
    pub fn new(items: Vec<PaymentItem>) -> Self {
        Self { items }
    }

    pub fn get_by_id(&self, id: &str) -> Option<&PaymentItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_by_provider_item_id(
        &self,
        provider_id: PaymentProvider,
        provider_item_id: &str,
    ) -> Option<&PaymentItem> {
        self.items
            .iter()
            .find(|item| item.provider_id == provider_id && item.provider_item_id == provider_item_id)
    }

    pub fn items(&self) -> &[PaymentItem] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PaymentItemCatalog {
        PaymentItemCatalog::new(vec![
            PaymentItem {
                id: "vip_monthly".to_string(),
                provider_id: PaymentProvider::Apple,
                provider_item_id: "vip.high.month".to_string(),
                item_type: PaymentItemType::AutoRenewableSubscription,
                duration_hours: None,
            },
            PaymentItem {
                id: "card_30d".to_string(),
                provider_id: PaymentProvider::Inner,
                provider_item_id: "card.30d".to_string(),
                item_type: PaymentItemType::NonRenewableSubscription,
                duration_hours: Some(30 * 24),
            },
        ])
    }

    #[test]
    fn looks_up_by_id_and_provider_item_id() {
        let catalog = catalog();

        assert!(catalog.get_by_id("vip_monthly").is_some());
        assert!(catalog.get_by_id("unknown").is_none());

        let found = catalog.get_by_provider_item_id(PaymentProvider::Apple, "vip.high.month");
        assert_eq!(found.map(|item| item.id.as_str()), Some("vip_monthly"));
        assert!(
            catalog
                .get_by_provider_item_id(PaymentProvider::Google, "vip.high.month")
                .is_none()
        );
    }

    #[test]
    fn renewable_follows_item_type() {
        let catalog = catalog();
        assert!(catalog.get_by_id("vip_monthly").unwrap().renewable());
        assert!(!catalog.get_by_id("card_30d").unwrap().renewable());
    }
}
