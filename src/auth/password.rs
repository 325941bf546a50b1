use anyhow::Context;
use argon2::{
    password_hash::{Output, PasswordHash, PasswordHasher, Salt, SaltString},
    Algorithm, Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Hashes `plain` under a fresh random salt and returns the PHC string,
/// which carries the salt next to the digest.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Splits a stored PHC string into its salt and digest.
pub fn split_phc(stored: &str) -> anyhow::Result<(Salt<'_>, Output)> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    if parsed.algorithm != Algorithm::default().ident() {
        anyhow::bail!("unsupported password hash algorithm: {}", parsed.algorithm);
    }
    let salt = parsed.salt.context("stored hash has no salt")?;
    let digest = parsed.hash.context("stored hash has no digest")?;
    Ok((salt, digest))
}

/// Re-derives the digest for `plain` under `salt` and compares it to `expected`.
///
/// `Output`'s equality is constant-time, so the comparison doesn't leak the
/// position of the first mismatching byte.
pub fn verify(plain: &str, salt: Salt<'_>, expected: &Output) -> anyhow::Result<bool> {
    let candidate = Argon2::default()
        .hash_password(plain.as_bytes(), salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?;
    Ok(candidate.hash.as_ref() == Some(expected))
}

/// Checks `plain` against a stored PHC string produced by [`hash_password`].
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let (salt, digest) = split_phc(stored)?;
    verify(plain, salt, &digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "Correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn salt_is_fresh_per_call() {
        let a = hash_password("Abcdefgh").expect("hash a");
        let b = hash_password("Abcdefgh").expect("hash b");
        let (salt_a, digest_a) = split_phc(&a).expect("split a");
        let (salt_b, digest_b) = split_phc(&b).expect("split b");
        assert_ne!(salt_a.as_str(), salt_b.as_str());
        assert_ne!(digest_a, digest_b);
        assert!(a.contains(salt_a.as_str()));
    }

    #[test]
    fn verify_with_explicit_salt_and_digest() {
        let stored = hash_password("Abcdefgh").expect("hash");
        let (salt, digest) = split_phc(&stored).expect("split");
        assert!(verify("Abcdefgh", salt, &digest).unwrap());
        assert!(!verify("abcdefgh", salt, &digest).unwrap());
    }

    #[test]
    fn foreign_algorithm_is_rejected() {
        let err = split_phc(
            "$argon2i$v=19$m=16,t=2,p=1$c29tZXNhbHQ$iWh06vD8Fy27wf9npn6FXWiCX4K6pW6Ue1Bnzz07Z8A",
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn plaintext_is_not_stored() {
        let hash = hash_password("Abcdefgh").expect("hash");
        assert!(!hash.contains("Abcdefgh"));
        assert!(hash.starts_with("$argon2id$"));
    }
}
