//! Construction of the per-run upstream clients.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::credentials::Credential;
use crate::config::Config;
use crate::forum::{DiscourseClient, ForumClient};
use crate::generator::{build_generator, ContentGenerator};

/// Builds the generator and forum client a run talks to.
#[async_trait]
pub trait Backends: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the generator cannot be constructed for `credential`.
    async fn generator(&self, credential: &Credential) -> Result<Arc<dyn ContentGenerator>>;

    /// # Errors
    ///
    /// Returns an error if the forum session cannot be opened.
    async fn forum(&self) -> Result<Arc<dyn ForumClient>>;
}

/// Real HTTP adapters, as configured.
pub struct HttpBackends {
    config: Arc<Config>,
}

impl HttpBackends {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Backends for HttpBackends {
    async fn generator(&self, credential: &Credential) -> Result<Arc<dyn ContentGenerator>> {
        build_generator(&self.config.generator, credential.expose()).with_context(|| {
            format!(
                "Failed to build generator for credential {}",
                credential.index()
            )
        })
    }

    async fn forum(&self) -> Result<Arc<dyn ForumClient>> {
        let client =
            DiscourseClient::new(&self.config.forum).context("Failed to build forum client")?;
        Ok(Arc::new(client))
    }
}
