/// Mint a fresh opaque identifier (UUID v4).
///
/// Ids are unique per process lifetime and never reused; callers treat them
/// as opaque strings.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
