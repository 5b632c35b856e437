use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `salt + password`. The salt is one constant for
/// every account.
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(salt: &str, password: &str, expected_hash: &str) -> bool {
    hash_password(salt, password) == expected_hash
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_password("rb_salt_", "hunter22"),
            "bf2b7ae98d64b3ffe950c66956051f0a659816e155656bbeeae851fabc4e2d55"
        );
    }

    #[test]
    fn test_verify() {
        let hash = hash_password("rb_salt_", "secret1");
        assert!(verify_password("rb_salt_", "secret1", &hash));
        assert!(!verify_password("rb_salt_", "secret2", &hash));
        assert!(!verify_password("other_", "secret1", &hash));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Cook@Example.COM "), "cook@example.com");
    }
}
