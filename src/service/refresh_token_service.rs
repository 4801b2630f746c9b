use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Digest-and-compare helpers for the single stored refresh token.
///
/// The stored value is the SHA-256 hex digest of the whole token (bcrypt
/// would only read the first 72 bytes of a JWT).
#[derive(Clone, Copy, Default)]
pub struct RefreshTokenService;

impl RefreshTokenService {
    pub fn new() -> Self {
        Self
    }

    pub fn hash_refresh_token(&self, token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }

    /// True when `presented` is the token whose digest is `stored`.
    pub fn matches_stored_hash(&self, presented: &str, stored: Option<&str>) -> bool {
        let Some(stored) = stored else {
            return false;
        };
        let presented_hash = self.hash_refresh_token(presented);

        presented_hash.len() == stored.len()
            && presented_hash.as_bytes().ct_eq(stored.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_refresh_token() {
        let service = RefreshTokenService::new();
        let hash1 = service.hash_refresh_token("test_refresh_token");
        let hash2 = service.hash_refresh_token("test_refresh_token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, service.hash_refresh_token("different_token"));
    }

    #[test]
    fn test_tokens_sharing_a_long_prefix_hash_differently() {
        let service = RefreshTokenService::new();
        let prefix = "x".repeat(100);

        assert_ne!(
            service.hash_refresh_token(&format!("{}a", prefix)),
            service.hash_refresh_token(&format!("{}b", prefix))
        );
    }

    #[test]
    fn test_matches_stored_hash() {
        let service = RefreshTokenService::new();
        let stored = service.hash_refresh_token("current");

        assert!(service.matches_stored_hash("current", Some(&stored)));
        assert!(!service.matches_stored_hash("previous", Some(&stored)));
        assert!(!service.matches_stored_hash("current", None));
        assert!(!service.matches_stored_hash("current", Some(&stored[..32])));
    }
}
