use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a control violation.
///
/// Identity fields:
/// - control_id
/// - code
/// - resource identifier
pub fn fingerprint_for_violation(control_id: &str, code: &str, identifier: &str) -> String {
    let canonical = [control_id, code, identifier].join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
