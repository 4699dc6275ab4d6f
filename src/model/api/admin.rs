use argon2::Config as Argon2Config;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw admin credentials, received from the assembly desk.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub password: String,
}

/// A successful admin login. The token is also set as a cookie; clients
/// that cannot use cookies send it back in the `X-Admin-Token` header.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminSession {
    pub token: String,
}

/// Hash an admin password into the encoded form expected by
/// `admin_password_hash`.
pub fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    let hash = argon2::hash_encoded(password.as_bytes(), &salt, &Argon2Config::default())?;
    Ok(hash)
}

/// Check a password against an encoded hash.
pub fn verify_password(hash: &str, password: &str) -> Result<bool> {
    Ok(argon2::verify_encoded(hash, password.as_bytes())?)
}

#[cfg(test)]
mod examples {
    use super::*;

    impl AdminCredentials {
        pub fn example() -> Self {
            Self {
                password: crate::test_support::ADMIN_PASSWORD.to_string(),
            }
        }

        pub fn wrong() -> Self {
            Self {
                password: "not-the-password".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("coordinator").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "coordinator").unwrap());
        assert!(!verify_password(&hash, "coordinator2").unwrap());

        // Salted, so hashing twice differs.
        assert_ne!(hash, hash_password("coordinator").unwrap());

        // Garbage hashes are an error, not a mismatch.
        assert!(verify_password("not-a-hash", "coordinator").is_err());
    }
}
