//! Restart runs forever, rotating credentials in between.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::credentials::CredentialPool;
use super::Scheduler;
use crate::constants::RESTART_COOLDOWN;

/// Whether the supervisor should start another run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    Shutdown,
}

pub struct Supervisor {
    scheduler: Scheduler,
    pool: CredentialPool,
    cooldown: Duration,
}

impl Supervisor {
    #[must_use]
    pub fn new(scheduler: Scheduler, pool: CredentialPool) -> Self {
        Self {
            scheduler,
            pool,
            cooldown: RESTART_COOLDOWN,
        }
    }

    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn active_credential(&self) -> usize {
        self.pool.active_index()
    }

    /// One run, the cooldown, then a credential advance.
    ///
    /// Failed runs rotate just like successful ones. Cancelling `shutdown`
    /// during the run or the cooldown skips the advance.
    pub async fn run_cycle(&mut self, shutdown: &CancellationToken) -> CycleOutcome {
        let credential = self.pool.active().clone();

        match self.scheduler.run_once(&credential, shutdown).await {
            Ok(summary) => info!(
                credential_index = summary.credential_index,
                reason = ?summary.reason,
                elapsed_secs = summary.elapsed.as_secs(),
                articles = summary.articles_published,
                comments = summary.comments_published,
                "Run finished"
            ),
            Err(e) => error!(credential_index = credential.index(), "Run failed: {e}"),
        }

        if shutdown.is_cancelled() {
            return CycleOutcome::Shutdown;
        }

        info!(
            cooldown_secs = self.cooldown.as_secs(),
            "Cooling down before next run"
        );
        tokio::select! {
            () = shutdown.cancelled() => return CycleOutcome::Shutdown,
            () = tokio::time::sleep(self.cooldown) => {}
        }

        let next = self.pool.advance();
        info!(
            credential_index = next,
            pool_size = self.pool.len(),
            "Rotated credential"
        );
        CycleOutcome::Continue
    }

    /// Run cycles until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(pool_size = self.pool.len(), "Supervisor started");
        while self.run_cycle(&shutdown).await == CycleOutcome::Continue {}
        info!("Supervisor stopped");
    }
}
