use uuid::Uuid;

/// Generates a new opaque entity identifier.
///
/// Identifiers are random UUIDs rendered in their hyphenated form. Collisions
/// are not checked for.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_creates_unique_ids() {
        let id1 = new_id();
        let id2 = new_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn new_id_is_a_uuid() {
        let id = new_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(id.len(), 36);
    }
}
