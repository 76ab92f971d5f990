use crate::error::AppError;
use bcrypt::{hash, verify};

/// Hashes a password with bcrypt at the configured cost (4..=31).
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks a password against a stored bcrypt hash.
///
/// bcrypt compares the derived hashes in constant time. A malformed stored hash
/// is treated as a mismatch and logged, never raised.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    match verify(password, hashed_password) {
        Ok(matches) => matches,
        Err(e) => {
            log::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the tests fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "test_password123";
        let hashed = hash_password_with_cost(password, TEST_COST).unwrap();

        assert_ne!(hashed, password);
        assert!(verify_password(password, &hashed));
        assert!(!verify_password("wrong_password", &hashed));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password_with_cost("same", TEST_COST).unwrap();
        let second = hash_password_with_cost("same", TEST_COST).unwrap();
        assert_ne!(first, second);
    }

    #[test_log::test]
    fn test_verify_with_invalid_hash_returns_false() {
        assert!(!verify_password("test_password123", "invalidhashformat"));
        assert!(!verify_password("test_password123", ""));
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        assert!(matches!(
            hash_password_with_cost("pw", 2),
            Err(AppError::InternalServerError(_))
        ));
    }
}
