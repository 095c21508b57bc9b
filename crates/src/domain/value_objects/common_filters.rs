use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommonFilterOperator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    DateRange,
    Range,
    In,
}

/// One predicate of the generic scan filter algebra. Filters on a request
/// compose with logical AND.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonFilter {
    pub field: String,
    pub operator: CommonFilterOperator,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
}

impl CommonFilter {
    pub fn first_value(&self) -> Option<&serde_json::Value> {
        self.values.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names_use_snake_case() {
        let filter: CommonFilter = serde_json::from_value(serde_json::json!({
            "field": "provider_id",
            "operator": "not_eq",
            "values": ["inner"],
        }))
        .unwrap();

        assert_eq!(filter.operator, CommonFilterOperator::NotEq);
        assert_eq!(filter.first_value(), Some(&serde_json::json!("inner")));
    }

    #[test]
    fn values_default_to_empty() {
        let filter: CommonFilter = serde_json::from_value(serde_json::json!({
            "field": "price",
            "operator": "gte",
        }))
        .unwrap();

        assert!(filter.values.is_empty());
    }
}
