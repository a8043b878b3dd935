//! One bot run: connect, drive the posting and commenting loops, drain, close.
//!
//! A run moves through [`RunState`] in order and publishes each transition on
//! a watch channel. The [`Supervisor`] starts runs back to back, rotating the
//! credential in between.

pub mod backends;
pub mod credentials;
pub mod supervisor;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{BotSettings, Config};
use crate::db::Stores;
use crate::forum::ForumClient;
use crate::generator::ContentGenerator;
use crate::memory::MemorySynthesizer;
use crate::pipeline::ContentPipeline;
use crate::trends::TrendSnapshot;

pub use backends::{Backends, HttpBackends};
pub use credentials::{Credential, CredentialPool, CredentialPoolError};
pub use supervisor::{CycleOutcome, Supervisor};

const POSTING_LOOP: &str = "posting";
const COMMENTING_LOOP: &str = "commenting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Connecting,
    Running,
    Draining,
    Closed,
}

impl RunState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Closed => "closed",
        }
    }
}

/// Why a run stopped without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeLimit,
    Shutdown,
    /// Every loop returned on its own.
    LoopsFinished,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to connect upstream clients: {0:#}")]
    Connect(anyhow::Error),
    #[error("{loop_name} loop died: {message}")]
    LoopFatal {
        loop_name: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub credential_index: usize,
    pub reason: EndReason,
    pub elapsed: Duration,
    pub articles_published: usize,
    pub comments_published: usize,
}

/// What a loop did before it was stopped.
#[derive(Debug, Clone, Copy)]
struct LoopReport {
    loop_name: &'static str,
    published: usize,
}

/// Shared handles for the two loops of one run.
struct RunContext {
    settings: Arc<BotSettings>,
    forum: Arc<dyn ForumClient>,
    stores: Stores,
    pipeline: ContentPipeline,
    memory: MemorySynthesizer,
    cancel: CancellationToken,
}

pub struct Scheduler {
    config: Arc<Config>,
    backends: Arc<dyn Backends>,
    state: watch::Sender<RunState>,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: Arc<Config>, backends: Arc<dyn Backends>) -> Self {
        let (state, _) = watch::channel(RunState::Closed);
        Self {
            config,
            backends,
            state,
        }
    }

    /// Watch run state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Execute one complete run with `credential`.
    ///
    /// Returns once the time limit passes, `shutdown` is cancelled, or a loop
    /// dies. Stores and the forum session are closed in every case.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Connect`] if the upstream clients cannot be built and
    /// [`RunError::LoopFatal`] if a loop task panics.
    pub async fn run_once(
        &self,
        credential: &Credential,
        shutdown: &CancellationToken,
    ) -> Result<RunSummary, RunError> {
        let started = Instant::now();
        let credential_index = credential.index();
        let settings = Arc::new(self.config.bot.clone());

        self.transition(RunState::Connecting, credential_index);
        let (stores, clients) = tokio::join!(
            Stores::open(&self.config.stores),
            self.connect_clients(credential)
        );
        let (generator, forum) = match clients {
            Ok(clients) => clients,
            Err(e) => {
                stores.close().await;
                self.transition(RunState::Closed, credential_index);
                return Err(RunError::Connect(e));
            }
        };

        let run_token = shutdown.child_token();
        let context = Arc::new(RunContext {
            pipeline: ContentPipeline::new(
                Arc::clone(&generator),
                Arc::clone(&forum),
                stores.content.clone(),
                Arc::clone(&settings),
                run_token.clone(),
            ),
            memory: MemorySynthesizer::new(generator),
            settings: Arc::clone(&settings),
            forum: Arc::clone(&forum),
            stores: stores.clone(),
            cancel: run_token.clone(),
        });

        self.transition(RunState::Running, credential_index);
        let mut tasks = JoinSet::new();
        tasks.spawn(guarded(POSTING_LOOP, posting_loop(Arc::clone(&context))));
        if settings.write_comment_enabled {
            tasks.spawn(guarded(COMMENTING_LOOP, commenting_loop(Arc::clone(&context))));
        }

        let use_time_limit = settings.use_time_limit;
        let max_run_time = settings.max_run_time;
        let deadline = async move {
            if use_time_limit {
                tokio::time::sleep(max_run_time).await;
            } else {
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(deadline);

        let mut reports = Vec::new();
        let mut failure = None;
        let reason = loop {
            tokio::select! {
                () = &mut deadline => break EndReason::TimeLimit,
                () = shutdown.cancelled() => break EndReason::Shutdown,
                joined = tasks.join_next() => match joined {
                    Some(outcome) => match loop_outcome(outcome) {
                        Ok(report) => reports.push(report),
                        Err(e) => {
                            failure = Some(e);
                            break EndReason::LoopsFinished;
                        }
                    },
                    None => break EndReason::LoopsFinished,
                },
            }
        };

        self.transition(RunState::Draining, credential_index);
        run_token.cancel();
        while let Some(outcome) = tasks.join_next().await {
            match loop_outcome(outcome) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(credential_index, "Loop failed while draining: {e}");
                    failure.get_or_insert(e);
                }
            }
        }

        stores.close().await;
        if let Err(e) = forum.close().await {
            warn!(credential_index, "Failed to close forum session: {e:#}");
        }
        self.transition(RunState::Closed, credential_index);

        if let Some(e) = failure {
            return Err(e);
        }

        let published = |name: &str| {
            reports
                .iter()
                .filter(|r| r.loop_name == name)
                .map(|r| r.published)
                .sum::<usize>()
        };
        Ok(RunSummary {
            credential_index,
            reason,
            elapsed: started.elapsed(),
            articles_published: published(POSTING_LOOP),
            comments_published: published(COMMENTING_LOOP),
        })
    }

    async fn connect_clients(
        &self,
        credential: &Credential,
    ) -> anyhow::Result<(Arc<dyn ContentGenerator>, Arc<dyn ForumClient>)> {
        let (generator, forum) =
            tokio::join!(self.backends.generator(credential), self.backends.forum());
        Ok((generator?, forum?))
    }

    fn transition(&self, state: RunState, credential_index: usize) {
        self.state.send_replace(state);
        info!(state = state.as_str(), credential_index, "Run state changed");
    }
}

/// Run a loop body, turning a panic into [`RunError::LoopFatal`].
async fn guarded(
    loop_name: &'static str,
    body: impl Future<Output = usize>,
) -> Result<LoopReport, RunError> {
    match AssertUnwindSafe(body).catch_unwind().await {
        Ok(published) => Ok(LoopReport {
            loop_name,
            published,
        }),
        Err(payload) => Err(RunError::LoopFatal {
            loop_name,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn loop_outcome(
    joined: Result<Result<LoopReport, RunError>, JoinError>,
) -> Result<LoopReport, RunError> {
    joined.map_err(|e| RunError::LoopFatal {
        loop_name: "unknown",
        message: e.to_string(),
    })?
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Sleep for `duration`; `false` if `cancel` fired first.
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

/// Observe the board, record memory when due, publish an article. Returns the
/// number of articles published.
async fn posting_loop(ctx: Arc<RunContext>) -> usize {
    let settings = &ctx.settings;
    let board_id = settings.board_id.as_str();
    let records_anything = settings.record_memory_enabled || settings.record_data_enabled;

    let mut published = 0;
    let mut next_record: Option<Instant> = None;

    info!(board_id, "Posting loop started");
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }

        match ctx.forum.recent_items(board_id, settings.crawl_window).await {
            Ok(items) => {
                let trends = TrendSnapshot::from_items(&items);
                debug!(board_id, items = items.len(), trends = trends.len(), "Board observed");

                let record_due = !matches!(next_record, Some(at) if Instant::now() < at);
                if records_anything && record_due {
                    ctx.memory.record(&items, settings, &ctx.stores).await;
                    next_record = Some(Instant::now() + settings.memory_record_interval);
                }

                if settings.write_article_enabled {
                    let memory = if settings.load_memory_enabled {
                        ctx.stores.memory.load_latest_memory(board_id).await
                    } else {
                        String::new()
                    };
                    if ctx.pipeline.produce_article(&trends, &memory).await.is_some() {
                        published += 1;
                    }
                }
            }
            Err(e) => warn!(board_id, "Failed to fetch recent items, skipping tick: {e:#}"),
        }

        if !pause(&ctx.cancel, settings.article_interval).await {
            break;
        }
    }

    info!(board_id, published, "Posting loop stopped");
    published
}

/// Comment on a random recent item each tick. Returns the number of comments
/// published.
async fn commenting_loop(ctx: Arc<RunContext>) -> usize {
    let settings = &ctx.settings;
    let board_id = settings.board_id.as_str();
    let mut published = 0;

    info!(board_id, "Commenting loop started");
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }

        match ctx.forum.random_item(board_id).await {
            Ok(Some(item)) => {
                if ctx.pipeline.produce_comment(&item.id, &item.title).await {
                    published += 1;
                }
            }
            Ok(None) => debug!(board_id, "Board is empty, nothing to comment on"),
            Err(e) => warn!(board_id, "Failed to pick an item to comment on: {e:#}"),
        }

        if !pause(&ctx.cancel, settings.comment_interval).await {
            break;
        }
    }

    info!(board_id, published, "Commenting loop stopped");
    published
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");
        let s: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(s.as_ref()), "kaboom");
        let s: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(s.as_ref()), "non-string panic payload");
    }

    async fn exploding_loop() -> usize {
        panic!("loop exploded")
    }

    #[tokio::test]
    async fn test_guarded_catches_panic() {
        let result = guarded("posting", exploding_loop()).await;
        match result {
            Err(RunError::LoopFatal { loop_name, message }) => {
                assert_eq!(loop_name, "posting");
                assert_eq!(message, "loop exploded");
            }
            other => panic!("expected LoopFatal, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_returns_false_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!pause(&cancel, Duration::from_secs(3600)).await);

        let live = CancellationToken::new();
        assert!(pause(&live, Duration::from_secs(1)).await);
    }
}
