use uuid::Uuid;

/// `<prefix>_<uuid>` 形式のID
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}
