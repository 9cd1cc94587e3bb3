//! bcrypt helpers. Both calls are CPU-bound; async callers run them on a blocking thread.

use crate::error::AppResult;

/// Hashes `password` with a fresh salt at the given bcrypt `cost`.
pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Checks `password` against a stored bcrypt hash.
///
/// A malformed hash is an internal error, not a failed login.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    Ok(bcrypt::verify(password, password_hash)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_matches_only_its_password() {
        let stored = hash_password("correct horse", TEST_COST).unwrap();
        assert!(stored.starts_with("$2"));
        assert!(verify_password("correct horse", &stored).unwrap());
        assert!(!verify_password("battery staple", &stored).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_hashes() {
        let first = hash_password("same_password", TEST_COST).unwrap();
        let second = hash_password("same_password", TEST_COST).unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same_password", &second).unwrap());
    }

    #[test]
    fn test_cost_out_of_range_is_internal_error() {
        let result = hash_password("whatever", 2);
        assert!(matches!(result, Err(AppError::InternalServerError(_))));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        match verify_password("secret", "not-a-bcrypt-hash") {
            Ok(true) => panic!("malformed hash must not verify"),
            Ok(false) | Err(AppError::InternalServerError(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
}
