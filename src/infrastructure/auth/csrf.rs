use rand::RngCore;

/// 256-bit double-submit token, hex-encoded for header and cookie transport.
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
