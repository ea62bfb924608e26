//! Password hashing (argon2id, PHC string format).
//!
//! Hashing is CPU-bound, so both entry points run on tokio's blocking pool.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::{EngineError, ResultEngine};

pub(crate) async fn hash_password(password: &str) -> ResultEngine<String> {
    let password = password.to_owned();
    blocking(move || hash_blocking(&password)).await
}

/// Returns `false` on mismatch, an error only when the stored hash is unreadable.
pub(crate) async fn verify_password(password: &str, stored: &str) -> ResultEngine<bool> {
    let (password, stored) = (password.to_owned(), stored.to_owned());
    blocking(move || verify_blocking(&password, &stored)).await
}

async fn blocking<T, F>(work: F) -> ResultEngine<T>
where
    F: FnOnce() -> ResultEngine<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?
}

fn hash_blocking(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

fn verify_blocking(password: &str, stored: &str) -> ResultEngine<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|err| EngineError::PasswordHash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("hunter22").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error() {
        assert!(verify_password("whatever", "not-a-phc-string").await.is_err());
    }
}
