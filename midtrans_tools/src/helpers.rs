use sha2::{Digest, Sha512};

/// The `signature_key` Midtrans attaches to its HTTP notifications: the hex encoded SHA-512 of the order id, status
/// code, gross amount and server key, concatenated in that order.
pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_signature(
    signature_key: &str,
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> bool {
    let expected = notification_signature(order_id, status_code, gross_amount, server_key);
    expected.eq_ignore_ascii_case(signature_key.trim())
}
