use sha2::Sha256;

const ITERATIONS: u32 = 120_000;
const KEY_LENGTH: usize = 32;

/// Hashes with PBKDF2-HMAC-SHA256, encoded as `iterations:salt:hash` with a hex salt and hash.
pub fn hash_password(password: &str) -> String {
    let salt = hex::encode(rand::random::<[u8; 16]>());
    let hash = derive(password, &salt, ITERATIONS);
    format!("{ITERATIONS}:{salt}:{}", hex::encode(hash))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split(':');
    let (Some(iterations), Some(salt), Some(hash)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 || salt.is_empty() || hash.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(hash) else {
        return false;
    };
    if expected.len() != KEY_LENGTH {
        return false;
    }

    // The salt is fed as its hex text, not the decoded bytes.
    let derived = derive(password, salt, iterations);
    constant_time_eq::constant_time_eq(&expected, &derived)
}

fn derive(password: &str, salt: &str, iterations: u32) -> [u8; KEY_LENGTH] {
    let mut out = [0u8; KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
    out
}
