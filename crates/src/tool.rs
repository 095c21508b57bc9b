use uuid::Uuid;

/// Time-ordered UUID so that insertion order is reflected in id ordering.
pub fn generate_uuid_v7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v7_ids_are_time_ordered() {
        let first = generate_uuid_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generate_uuid_v7();
        assert!(first < second);
    }
}
