//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Generate a worker id: `w` followed by the 32 hex digits of a UUIDv4.
///
/// The `w` prefix keeps generated ids in the same namespace as the seed
/// roster (`w1`..`w6`).
pub fn generate_worker_id() -> String {
    format!("w{}", generate().simple())
}
