//! Circular pool of upstream credentials, one active per run.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialPoolError {
    #[error("credential pool must contain at least one credential")]
    Empty,
}

/// A credential together with its position in the pool.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    index: usize,
    secret: String,
}

impl Credential {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The raw secret, for handing to an adapter.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("index", &self.index)
            .field("secret", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    active: usize,
}

impl CredentialPool {
    /// # Errors
    ///
    /// Returns [`CredentialPoolError::Empty`] if `secrets` is empty.
    pub fn new(secrets: Vec<String>) -> Result<Self, CredentialPoolError> {
        if secrets.is_empty() {
            return Err(CredentialPoolError::Empty);
        }
        let credentials = secrets
            .into_iter()
            .enumerate()
            .map(|(index, secret)| Credential { index, secret })
            .collect();
        Ok(Self {
            credentials,
            active: 0,
        })
    }

    #[must_use]
    pub fn active(&self) -> &Credential {
        &self.credentials[self.active]
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Move to the next credential, wrapping around; returns the new index.
    pub fn advance(&mut self) -> usize {
        self.active = (self.active + 1) % self.credentials.len();
        self.active
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> CredentialPool {
        CredentialPool::new((0..n).map(|i| format!("key-{i}")).collect()).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert_eq!(
            CredentialPool::new(Vec::new()).unwrap_err(),
            CredentialPoolError::Empty
        );
    }

    #[test]
    fn test_rotation_wraps() {
        let mut pool = pool(3);
        assert_eq!(pool.active().expose(), "key-0");
        assert_eq!(pool.advance(), 1);
        assert_eq!(pool.advance(), 2);
        assert_eq!(pool.advance(), 0);
        assert_eq!(pool.active().expose(), "key-0");
    }

    #[test]
    fn test_single_credential_stays_put() {
        let mut pool = pool(1);
        assert_eq!(pool.advance(), 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let pool = pool(1);
        let rendered = format!("{:?}", pool.active());
        assert!(!rendered.contains("key-0"));
        assert!(rendered.contains("redacted"));
    }
}
