//! Password hashing

use crate::error::Result;

/// Hash compared against when the username does not exist, so an unknown
/// user costs the same bcrypt work as a wrong password.
const DUMMY_HASH: &str = "$2b$12$C6UzMDM.H6dfI/f/IKcEeO5x7yS1l4rP2H2QZ5gXz1o5d0gSe6c1u";

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Check `password` against a stored hash; a missing hash always fails
pub fn verify_password(password: &str, hash: Option<&str>) -> bool {
    match hash {
        Some(hash) => bcrypt::verify(password, hash).unwrap_or_else(|e| {
            tracing::error!(error = %e, "stored password hash is unreadable");
            false
        }),
        None => {
            let _ = bcrypt::verify(password, DUMMY_HASH);
            false
        }
    }
}

/// [`verify_password`] on the blocking thread pool
pub async fn verify_password_blocking(password: String, hash: Option<String>) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&password, hash.as_deref()))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2", 4).unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", Some(&hash)));
        assert!(!verify_password("hunter3", Some(&hash)));
    }

    #[test]
    fn test_missing_hash_never_verifies() {
        assert!(!verify_password("anything", None));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("hunter2", Some("not-a-bcrypt-hash")));
    }

    #[tokio::test]
    async fn test_verify_blocking() {
        let hash = hash_password("pw", 4).unwrap();
        assert!(verify_password_blocking("pw".to_string(), Some(hash.clone())).await);
        assert!(!verify_password_blocking("nope".to_string(), Some(hash)).await);
    }
}
